//! Macros to reduce boilerplate in pickable implementations

/// Implements the property accessors and `Any` casts of
/// [`Pickable`](crate::layers::base::Pickable) for a type that keeps its
/// [`PickableProperties`](crate::layers::base::PickableProperties) in a field.
///
/// Usage:
/// ```ignore
/// impl Pickable for MyOverlay {
///     mapview::impl_pickable!(properties);
///     // geometry methods...
/// }
/// ```
#[macro_export]
macro_rules! impl_pickable {
    ($properties_field:ident) => {
        fn properties(&self) -> &$crate::layers::base::PickableProperties {
            &self.$properties_field
        }

        fn properties_mut(&mut self) -> &mut $crate::layers::base::PickableProperties {
            &mut self.$properties_field
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}

use std::path::{Component, Path};

/// Whether `name` is exactly one normal path component, so joining it under a
/// directory always names a direct child of that directory.
pub fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}

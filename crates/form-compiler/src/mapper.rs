use form_types::FieldKind;

/// Map a template's declared type tag to a renderable kind.
///
/// Unknown tags fall back to short text so a malformed template still renders.
pub fn map_type(tag: &str) -> FieldKind {
    match tag {
        "text" => FieldKind::ShortText,
        "textarea" => FieldKind::LongText,
        "numberInt" => FieldKind::Integer,
        "select" => FieldKind::SingleSelect,
        "datetime" => FieldKind::DateTime,
        "photo" => FieldKind::Photo,
        "file" => FieldKind::GenericFile,
        "checkbox" => FieldKind::Boolean,
        _ => FieldKind::ShortText,
    }
}

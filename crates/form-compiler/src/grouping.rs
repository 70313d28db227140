//! Grouping of compiled fields for display

use form_types::CompiledField;
use serde::Serialize;

/// Fields sharing one group name, in form order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldGroup<'a> {
    pub name: &'a str,
    pub fields: Vec<&'a CompiledField>,
}

/// Group fields by group name. Groups appear in first-seen order.
pub fn group_fields(fields: &[CompiledField]) -> Vec<FieldGroup<'_>> {
    let mut groups: Vec<FieldGroup<'_>> = Vec::new();

    for field in fields {
        match groups.iter_mut().find(|g| g.name == field.group) {
            Some(group) => group.fields.push(field),
            None => groups.push(FieldGroup {
                name: &field.group,
                fields: vec![field],
            }),
        }
    }

    groups
}

/// A unit the renderer lays out: a lone field or a whole fieldset
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "block", rename_all = "snake_case")]
pub enum RenderBlock<'a> {
    Field(&'a CompiledField),
    Fieldset {
        title: &'a str,
        fields: Vec<&'a CompiledField>,
    },
}

/// Fold fieldset markers into blocks in one forward pass.
///
/// Expects balanced markers (as produced by the template compiler); an
/// unterminated fieldset is emitted with whatever members it collected.
pub fn render_blocks(fields: &[CompiledField]) -> Vec<RenderBlock<'_>> {
    let mut blocks = Vec::new();
    let mut current: Option<(&str, Vec<&CompiledField>)> = None;

    for field in fields {
        if field.fieldset_start {
            if let Some((title, members)) = current.take() {
                blocks.push(RenderBlock::Fieldset { title, fields: members });
            }
            let title = field.fieldset_title.as_deref().unwrap_or(&field.label);
            current = Some((title, vec![field]));
        } else if field.fieldset_member && current.is_some() {
            if let Some((_, members)) = current.as_mut() {
                members.push(field);
            }
        } else {
            if let Some((title, members)) = current.take() {
                blocks.push(RenderBlock::Fieldset { title, fields: members });
            }
            blocks.push(RenderBlock::Field(field));
        }

        if field.fieldset_end {
            if let Some((title, members)) = current.take() {
                blocks.push(RenderBlock::Fieldset { title, fields: members });
            }
        }
    }

    if let Some((title, members)) = current {
        blocks.push(RenderBlock::Fieldset { title, fields: members });
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::compile_template;
    use form_types::{RawField, RawTemplate};

    fn sample() -> Vec<CompiledField> {
        let template = RawTemplate::new(
            "F-1",
            "Inspection",
            vec![
                RawField::new("site", "Site", "text").in_category("General", 1, 1),
                RawField::new("roof", "Roof", "text")
                    .in_category("Exterior", 2, 1)
                    .with_comment("roof_comment")
                    .with_photo(),
                RawField::new("walls", "Walls", "text").in_category("Exterior", 2, 2),
                RawField::new("notes", "Notes", "textarea").in_category("General", 3, 1),
            ],
        );
        compile_template(&template).unwrap().fields
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let fields = sample();
        let groups = group_fields(&fields);
        let names: Vec<_> = groups.iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["General", "Exterior"]);

        let general: Vec<_> = groups[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(general, vec!["site", "notes"]);
        assert_eq!(groups[1].fields.len(), 4);
    }

    #[test]
    fn test_render_blocks_fold_fieldsets() {
        let fields = sample();
        let blocks = render_blocks(&fields);
        assert_eq!(blocks.len(), 4);

        assert!(matches!(blocks[0], RenderBlock::Field(f) if f.name == "site"));
        match &blocks[1] {
            RenderBlock::Fieldset { title, fields } => {
                assert_eq!(*title, "Roof");
                let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["roof", "roof_comment", "roof_photo"]);
            }
            other => panic!("expected fieldset, got {:?}", other),
        }
        assert!(matches!(blocks[2], RenderBlock::Field(f) if f.name == "walls"));
        assert!(matches!(blocks[3], RenderBlock::Field(f) if f.name == "notes"));
    }

    #[test]
    fn test_render_blocks_serialize_tagged() {
        let fields = sample();
        let json = serde_json::to_value(render_blocks(&fields)).unwrap();
        assert_eq!(json[0]["block"], "field");
        assert_eq!(json[1]["block"], "fieldset");
        assert_eq!(json[1]["title"], "Roof");
    }
}

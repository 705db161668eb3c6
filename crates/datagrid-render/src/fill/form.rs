//! Form fill: sort/direction selects and a hidden page field.

use datagrid_source::Dir;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};
use crate::renderer::RenderContext;

/// A `(value, label)` pair of a select element.
pub type SelectOption = (String, String);

/// A form that accepts generated elements.
///
/// Implementations return `Err(reason)` to refuse an element, e.g. when the
/// name is already taken.
pub trait FormTarget {
    fn add_select(
        &mut self,
        name: &str,
        label: &str,
        options: &[SelectOption],
        selected: Option<&str>,
    ) -> std::result::Result<(), String>;

    fn add_hidden(&mut self, name: &str, value: &str) -> std::result::Result<(), String>;
}

/// An element registered on a [`Form`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FormElement {
    Select {
        name: String,
        label: String,
        options: Vec<SelectOption>,
        selected: Option<String>,
    },
    Hidden {
        name: String,
        value: String,
    },
}

impl FormElement {
    pub fn name(&self) -> &str {
        match self {
            FormElement::Select { name, .. } | FormElement::Hidden { name, .. } => name,
        }
    }
}

/// In-memory form. Refuses duplicate element names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Form {
    elements: Vec<FormElement>,
}

impl Form {
    pub fn new() -> Self {
        Form::default()
    }

    pub fn elements(&self) -> &[FormElement] {
        &self.elements
    }

    pub fn element(&self, name: &str) -> Option<&FormElement> {
        self.elements.iter().find(|e| e.name() == name)
    }

    fn push(&mut self, element: FormElement) -> std::result::Result<(), String> {
        if self.element(element.name()).is_some() {
            return Err("an element with this name already exists".to_string());
        }
        self.elements.push(element);
        Ok(())
    }
}

impl FormTarget for Form {
    fn add_select(
        &mut self,
        name: &str,
        label: &str,
        options: &[SelectOption],
        selected: Option<&str>,
    ) -> std::result::Result<(), String> {
        self.push(FormElement::Select {
            name: name.to_string(),
            label: label.to_string(),
            options: options.to_vec(),
            selected: selected.map(str::to_string),
        })
    }

    fn add_hidden(&mut self, name: &str, value: &str) -> std::result::Result<(), String> {
        self.push(FormElement::Hidden {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

/// Options for [`fill_form`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    pub sort_label: String,
    pub direction_label: String,
    /// Label of the empty "no sort" option. `None` leaves it out.
    pub unsorted_label: Option<String>,
    pub ascending_label: String,
    pub descending_label: String,
    /// Register the current page as a hidden field.
    pub include_page: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        FormOptions {
            sort_label: "Sort by".to_string(),
            direction_label: "Direction".to_string(),
            unsorted_label: Some("default".to_string()),
            ascending_label: "Ascending".to_string(),
            descending_label: "Descending".to_string(),
            include_page: true,
        }
    }
}

/// Registers the grid's sort and page state on a form.
///
/// Element names are the grid's request parameter names, so submitting the
/// form produces a request the coordinator understands. Only sortable
/// columns are offered.
pub fn fill_form(
    ctx: &RenderContext<'_>,
    target: &mut dyn FormTarget,
    options: &FormOptions,
) -> Result<()> {
    let names = ctx.links.names();

    let mut fields: Vec<SelectOption> = Vec::new();
    if let Some(label) = &options.unsorted_label {
        fields.push((String::new(), label.clone()));
    }
    fields.extend(
        ctx.columns
            .iter()
            .filter(|c| c.sortable)
            .map(|c| (c.field.clone(), c.label.clone())),
    );
    let order_by = names.order_by_key();
    target
        .add_select(&order_by, &options.sort_label, &fields, ctx.sort.field())
        .map_err(|reason| RenderError::fill_rejected("form", order_by.clone(), reason))?;

    let directions = vec![
        (Dir::Asc.as_str().to_string(), options.ascending_label.clone()),
        (Dir::Desc.as_str().to_string(), options.descending_label.clone()),
    ];
    let direction = names.direction_key();
    target
        .add_select(
            &direction,
            &options.direction_label,
            &directions,
            ctx.sort.dir().map(Dir::as_str),
        )
        .map_err(|reason| RenderError::fill_rejected("form", direction.clone(), reason))?;

    if options.include_page && ctx.page.is_paged() {
        let page = names.page_key();
        target
            .add_hidden(&page, &ctx.page.page().to_string())
            .map_err(|reason| RenderError::fill_rejected("form", page.clone(), reason))?;
    }
    Ok(())
}

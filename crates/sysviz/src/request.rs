//! Visualization request construction.
//!
//! A [`VizRequest`] captures the (view, style, element) triple and renders
//! it into the kernel's `%viz` magic syntax. Validation happens here, so a
//! bad request fails before any kernel process is spawned.

use std::{fmt, str::FromStr};

use crate::error::VizError;

/// Diagram layout strategies recognized by the kernel's `%viz` magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    Default,
    /// Hierarchical tree view, the kernel's own default.
    #[default]
    Tree,
    State,
    Interconnection,
    Action,
    Sequence,
    Case,
    /// The kernel spells this one in capitals.
    Mixed,
}

impl View {
    /// All recognized view names, as accepted on the command line.
    pub const NAMES: [&'static str; 8] = [
        "Default",
        "Tree",
        "State",
        "Interconnection",
        "Action",
        "Sequence",
        "Case",
        "MIXED",
    ];

    /// The spelling the kernel expects after `--view`.
    pub fn as_magic(&self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Tree => "Tree",
            Self::State => "State",
            Self::Interconnection => "Interconnection",
            Self::Action => "Action",
            Self::Sequence => "Sequence",
            Self::Case => "Case",
            Self::Mixed => "MIXED",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_magic())
    }
}

impl FromStr for View {
    type Err = VizError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "tree" => Ok(Self::Tree),
            "state" => Ok(Self::State),
            "interconnection" => Ok(Self::Interconnection),
            "action" => Ok(Self::Action),
            "sequence" => Ok(Self::Sequence),
            "case" => Ok(Self::Case),
            "mixed" => Ok(Self::Mixed),
            _ => Err(VizError::InvalidRequest(format!(
                "unknown view `{name}` (expected one of: {})",
                Self::NAMES.join(", ")
            ))),
        }
    }
}

/// An immutable visualization request.
#[derive(Debug, Clone)]
pub struct VizRequest {
    view: View,
    style: Option<String>,
    element: Option<String>,
}

impl VizRequest {
    /// Build a request, validating the optional fields.
    ///
    /// # Errors
    ///
    /// Returns [`VizError::InvalidRequest`] when `style` or `element` is
    /// supplied but empty.
    pub fn new(
        view: View,
        style: Option<String>,
        element: Option<String>,
    ) -> Result<Self, VizError> {
        if let Some(style) = &style {
            if style.trim().is_empty() {
                return Err(VizError::InvalidRequest(
                    "style was supplied but is empty".into(),
                ));
            }
        }
        if let Some(element) = &element {
            if element.trim().is_empty() {
                return Err(VizError::InvalidRequest(
                    "element path was supplied but is empty".into(),
                ));
            }
        }
        Ok(Self {
            view,
            style,
            element,
        })
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    /// The explicit element path, e.g. `VehicleExample::Vehicle`.
    pub fn element(&self) -> Option<&str> {
        self.element.as_deref()
    }

    /// Render the `%viz` magic command for `target`.
    ///
    /// `target` is the element path when one was supplied, otherwise the
    /// detected package name.
    pub fn magic(&self, target: &str) -> String {
        let mut command = format!("%viz --view {}", self.view.as_magic());
        if let Some(style) = &self.style {
            command.push_str(" --style ");
            command.push_str(style);
        }
        command.push(' ');
        command.push_str(target);
        command
    }

    /// The same request with the view forced to Tree, used for the single
    /// fallback attempt when another view yields nothing.
    pub fn with_tree_view(&self) -> Self {
        Self {
            view: View::Tree,
            style: self.style.clone(),
            element: self.element.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_parses_case_insensitively() {
        assert_eq!("tree".parse::<View>().unwrap(), View::Tree);
        assert_eq!("INTERCONNECTION".parse::<View>().unwrap(), View::Interconnection);
        assert_eq!("mixed".parse::<View>().unwrap(), View::Mixed);
    }

    #[test]
    fn unknown_view_is_invalid_request() {
        let err = "Spiral".parse::<View>().unwrap_err();
        assert!(matches!(err, VizError::InvalidRequest(_)));
        assert!(err.to_string().contains("Spiral"));
        assert!(err.to_string().contains("Tree"));
    }

    #[test]
    fn magic_renders_full_triple() {
        let request = VizRequest::new(
            View::Interconnection,
            Some("stdcolor".into()),
            Some("VehicleExample::Vehicle".into()),
        )
        .unwrap();
        assert_eq!(
            request.magic(request.element().unwrap()),
            "%viz --view Interconnection --style stdcolor VehicleExample::Vehicle"
        );
    }

    #[test]
    fn magic_without_optionals_targets_package() {
        let request = VizRequest::new(View::Tree, None, None).unwrap();
        assert_eq!(request.magic("Demo"), "%viz --view Tree Demo");
    }

    #[test]
    fn mixed_view_is_spelled_in_capitals() {
        let request = VizRequest::new(View::Mixed, None, None).unwrap();
        assert_eq!(request.magic("Demo"), "%viz --view MIXED Demo");
    }

    #[test]
    fn empty_element_is_rejected() {
        let err = VizRequest::new(View::Tree, None, Some("  ".into())).unwrap_err();
        assert!(matches!(err, VizError::InvalidRequest(_)));
    }

    #[test]
    fn empty_style_is_rejected() {
        let err = VizRequest::new(View::Tree, Some(String::new()), None).unwrap_err();
        assert!(matches!(err, VizError::InvalidRequest(_)));
    }

    #[test]
    fn tree_fallback_keeps_style_and_element() {
        let request = VizRequest::new(View::State, Some("stdcolor".into()), Some("P::E".into()))
            .unwrap()
            .with_tree_view();
        assert_eq!(request.view(), View::Tree);
        assert_eq!(request.style(), Some("stdcolor"));
        assert_eq!(request.element(), Some("P::E"));
    }
}

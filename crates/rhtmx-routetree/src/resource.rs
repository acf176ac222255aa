//! RESTful resources: a convention-based bundle of seven actions

use crate::action::{ActionTarget, Method, RouteAction};
use crate::language::LanguageMapping;
use crate::parameter::RouteParameter;

/// The seven conventional resource actions, in declaration order
pub const RESOURCE_ACTIONS: [&str; 7] =
    ["index", "create", "store", "show", "edit", "update", "destroy"];

/// A resource declared on a node
#[derive(Debug, Clone)]
pub struct RouteResource {
    parameter: RouteParameter,
    controller: String,
}

impl RouteResource {
    pub fn new(parameter: RouteParameter, controller: impl Into<String>) -> Self {
        Self {
            parameter,
            controller: controller.into(),
        }
    }

    pub fn parameter(&self) -> &RouteParameter {
        &self.parameter
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// Whether the named resource action addresses a single item
    pub fn is_item_action(action: &str) -> bool {
        matches!(action, "show" | "edit" | "update" | "destroy")
    }

    /// Builds the requested resource actions for `locales`
    ///
    /// `create` and `edit` carry the given localized suffixes (falling back
    /// to the literal action name); item actions (`show`, `edit`, `update`,
    /// `destroy`) are prefixed with the resource's placeholder.
    pub fn actions(
        &self,
        only: &[&str],
        locales: &[String],
        create_segment: &LanguageMapping<String>,
        edit_segment: &LanguageMapping<String>,
    ) -> Vec<RouteAction> {
        let placeholder = self.parameter.placeholder();
        let per_locale = |suffix: &dyn Fn(&str) -> String| -> LanguageMapping<String> {
            locales
                .iter()
                .map(|locale| (locale.as_str(), suffix(locale)))
                .collect()
        };

        RESOURCE_ACTIONS
            .iter()
            .filter(|name| only.contains(*name))
            .map(|&name| {
                let method = match name {
                    "store" => Method::Post,
                    "update" => Method::Put,
                    "destroy" => Method::Delete,
                    _ => Method::Get,
                };

                let mut action = RouteAction::new(
                    method,
                    ActionTarget::Controller {
                        controller: self.controller.clone(),
                        method: name.to_string(),
                    },
                );
                action.named(name);

                match name {
                    "create" => {
                        action.segments(per_locale(&|locale| {
                            create_segment
                                .get(locale)
                                .cloned()
                                .unwrap_or_else(|| "create".to_string())
                        }));
                    }
                    "edit" => {
                        action.segments(per_locale(&|locale| {
                            let suffix = edit_segment.get(locale).map(String::as_str);
                            format!("{}/{}", placeholder, suffix.unwrap_or("edit"))
                        }));
                    }
                    "show" | "update" | "destroy" => {
                        action.segments(per_locale(&|_| placeholder.clone()));
                    }
                    _ => {}
                }

                action
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locales() -> Vec<String> {
        vec!["de".to_string(), "en".to_string()]
    }

    fn suffixes(value: &str) -> LanguageMapping<String> {
        LanguageMapping::uniform(["de", "en"], value.to_string())
    }

    #[test]
    fn test_all_seven_actions() {
        let resource = RouteResource::new(RouteParameter::new("photo"), "PhotoController");
        let actions = resource.actions(&RESOURCE_ACTIONS, &locales(), &suffixes("create"), &suffixes("edit"));

        let names: Vec<&str> = actions.iter().map(|a| a.name()).collect();
        assert_eq!(names, RESOURCE_ACTIONS.to_vec());

        let edit = &actions[4];
        assert_eq!(edit.segment_for("en"), Some("{photo}/edit"));
        let store = &actions[2];
        assert_eq!(store.method(), Method::Post);
        assert_eq!(store.segment_for("en"), None);
    }

    #[test]
    fn test_only_subset() {
        let resource = RouteResource::new(RouteParameter::new("photo"), "PhotoController");
        let actions = resource.actions(&["index", "show"], &locales(), &suffixes("create"), &suffixes("edit"));
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[1].segment_for("de"), Some("{photo}"));

        let localized: LanguageMapping<String> = LanguageMapping::new().with("de", "bearbeiten");
        let actions = resource.actions(&["edit"], &locales(), &suffixes("create"), &localized);
        assert_eq!(actions[0].segment_for("de"), Some("{photo}/bearbeiten"));
        assert_eq!(actions[0].segment_for("en"), Some("{photo}/edit"));
    }
}

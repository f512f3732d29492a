//! Prompt templates for MCP server

/// Argument definition for a prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplateArg {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

/// Definition of a prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub template: &'static str,
    pub arguments: &'static [PromptTemplateArg],
}

impl PromptTemplate {
    /// Substitutes `{name}` placeholders. Returns the names of missing
    /// required arguments on failure.
    pub fn render<'a>(
        &self,
        lookup: impl Fn(&str) -> Option<&'a str>,
    ) -> Result<String, Vec<&'static str>> {
        let mut text = self.template.to_string();
        let mut missing = Vec::new();
        for arg in self.arguments {
            match lookup(arg.name) {
                Some(value) => text = text.replace(&format!("{{{}}}", arg.name), value),
                None if arg.required => missing.push(arg.name),
                None => text = text.replace(&format!("{{{}}}", arg.name), ""),
            }
        }
        if missing.is_empty() {
            Ok(text)
        } else {
            Err(missing)
        }
    }
}

pub const PROMPT_TEMPLATES: &[PromptTemplate] = &[
    PromptTemplate {
        name: "plan_trip",
        description: "Build or revise a trip itinerary with Waypoint's command tools",
        template: r#"You are a careful travel planner editing the Waypoint trip `{trip}`.

# Goal
{goal}

# How to work
1. Call `show_trip` with trip="{trip}" to read the current itinerary and item ids.
   If the trip does not exist, start your first batch with `/create-trip {trip} name="..."`.
2. Call `command_help` if you are unsure of a command's arguments.
3. Send changes with `apply_commands`, one command per line. Before a group of
   changes, state what you are doing with `/intent "..."`.
4. Re-read the itinerary after each batch and fix anything that looks wrong
   with `/edit`, `/delete` or `/undo`.

# Command reminders
- `/add name="..." type=sight date=YYYY-MM-DD` adds an item; its id appears in the reply.
- `/edit <id> field="value"` changes fields; `field=""` clears one.
- `/move-range from=YYYY-MM-DD to=YYYY-MM-DD days=N` shifts a block of days.
- `/insert-gap YYYY-MM-DD` and `/remove-range YYYY-MM-DD` push later items by one day.
- `/undo [n]` and `/redo [n]` walk the history. A new change after an undo discards the redo history.

Keep batches small and focused."#,
        arguments: &[
            PromptTemplateArg {
                name: "trip",
                description: "Trip id to edit",
                required: true,
            },
            PromptTemplateArg {
                name: "goal",
                description: "What the itinerary should achieve",
                required: true,
            },
        ],
    },
    PromptTemplate {
        name: "review_trip",
        description: "Review an itinerary for date conflicts and gaps without changing it",
        template: r#"Review the Waypoint trip `{trip}`.

Call `show_trip` and `show_journal` with trip="{trip}". Then report:
- days with no items, or with more items than is comfortable
- items missing a date or type
- recent changes in the journal that look accidental (for example an undone command)

{focus}

Do not call `apply_commands`; suggest command lines instead."#,
        arguments: &[
            PromptTemplateArg {
                name: "trip",
                description: "Trip id to review",
                required: true,
            },
            PromptTemplateArg {
                name: "focus",
                description: "Anything specific to look at",
                required: false,
            },
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_arguments() {
        let template = &PROMPT_TEMPLATES[1];
        let text = template
            .render(|name| (name == "trip").then_some("rome"))
            .unwrap();
        assert!(text.contains("Review the Waypoint trip `rome`."));
        assert!(!text.contains("{focus}"));
    }

    #[test]
    fn test_render_reports_missing_arguments() {
        let missing = PROMPT_TEMPLATES[0].render(|_| None).unwrap_err();
        assert_eq!(missing, ["trip", "goal"]);
    }
}

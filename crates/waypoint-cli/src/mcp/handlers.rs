//! MCP tool handlers implementation

use log::debug;
use rmcp::{
    handler::server::tool::Parameters,
    model::{
        CallToolResult, Content, GetPromptRequestParam, GetPromptResult, ListPromptsResult,
        Prompt, PromptArgument, PromptMessage, PromptMessageContent, PromptMessageRole,
    },
    ErrorData as McpError,
};
use schemars::JsonSchema;
use serde::Deserialize;
use waypoint_core::{params as core, Engine, HelpText, Origin, TripList};

use super::{errors::to_mcp_error, prompts::PROMPT_TEMPLATES};

/// Generic MCP wrapper for core parameter types with serde integration
///
/// Provides JSON deserialization and schema generation for any parameter
/// type while keeping the core types free of MCP concerns.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct McpParams<T>(T)
where
    T: JsonSchema;

impl<T> JsonSchema for McpParams<T>
where
    T: JsonSchema,
{
    fn schema_name() -> std::borrow::Cow<'static, str> {
        T::schema_name()
    }

    fn json_schema(g: &mut schemars::SchemaGenerator) -> schemars::Schema {
        T::json_schema(g)
    }
}

impl<T> AsRef<T> for McpParams<T>
where
    T: JsonSchema,
{
    fn as_ref(&self) -> &T {
        &self.0
    }
}

// Type aliases for cleaner usage in function signatures
pub type ApplyCommands = McpParams<core::ApplyCommands>;
pub type TripRef = McpParams<core::TripRef>;
pub type HelpTopic = McpParams<core::HelpTopic>;

pub type McpResult = Result<CallToolResult, McpError>;

fn text(body: impl Into<String>) -> McpResult {
    Ok(CallToolResult::success(vec![Content::text(body)]))
}

/// Handler implementations for the MCP server
pub struct McpHandlers {
    engine: Engine,
}

impl McpHandlers {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Applies a batch on the assistant's behalf and returns the messages
    /// followed by the updated itinerary.
    pub async fn apply_commands(
        &self,
        Parameters(params): Parameters<ApplyCommands>,
    ) -> McpResult {
        debug!("apply_commands: {:?}", params);
        let params = params.as_ref();
        params
            .validate()
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        let outcome = self
            .engine
            .apply_batch_as(&params.trip, &params.commands, Origin::Assistant)
            .await
            .map_err(|e| to_mcp_error("Failed to apply commands", &e))?;
        text(format!("{outcome}\n{}", outcome.model))
    }

    pub async fn show_trip(&self, Parameters(params): Parameters<TripRef>) -> McpResult {
        debug!("show_trip: {:?}", params);
        let model = self
            .engine
            .current_model(&params.as_ref().trip)
            .await
            .map_err(|e| to_mcp_error("Failed to load trip", &e))?;
        text(model.to_string())
    }

    pub async fn show_journal(&self, Parameters(params): Parameters<TripRef>) -> McpResult {
        debug!("show_journal: {:?}", params);
        let log = self
            .engine
            .journal_log(&params.as_ref().trip)
            .await
            .map_err(|e| to_mcp_error("Failed to load journal", &e))?;
        text(log.to_string())
    }

    pub async fn list_trips(&self) -> McpResult {
        debug!("list_trips");
        let trips = self
            .engine
            .list_trips()
            .await
            .map_err(|e| to_mcp_error("Failed to list trips", &e))?;
        text(TripList::new(trips).to_string())
    }

    pub async fn command_help(&self, Parameters(params): Parameters<HelpTopic>) -> McpResult {
        debug!("command_help: {:?}", params);
        text(HelpText::new(params.as_ref().topic.as_deref()).to_string())
    }

    /// List all available prompts
    pub fn list_prompts(&self) -> ListPromptsResult {
        debug!("list_prompts");
        let prompts = PROMPT_TEMPLATES
            .iter()
            .map(|template| {
                Prompt::new(
                    template.name,
                    Some(template.description),
                    Some(
                        template
                            .arguments
                            .iter()
                            .map(|arg| PromptArgument {
                                name: arg.name.to_string(),
                                description: Some(arg.description.to_string()),
                                required: Some(arg.required),
                            })
                            .collect(),
                    ),
                )
            })
            .collect();

        ListPromptsResult {
            next_cursor: None,
            prompts,
        }
    }

    /// Get a specific prompt by name and apply arguments
    pub fn get_prompt(&self, request: &GetPromptRequestParam) -> Result<GetPromptResult, McpError> {
        debug!("get_prompt: {}", request.name);

        let template = PROMPT_TEMPLATES
            .iter()
            .find(|t| t.name == request.name)
            .ok_or_else(|| McpError::invalid_params("Prompt not found", None))?;

        let prompt_text = template
            .render(|name| {
                request
                    .arguments
                    .as_ref()
                    .and_then(|args| args.get(name))
                    .and_then(|value| value.as_str())
            })
            .map_err(|missing| {
                McpError::invalid_params(
                    format!("Required arguments missing: {}", missing.join(", ")),
                    None,
                )
            })?;

        Ok(GetPromptResult {
            description: Some(template.description.to_string()),
            messages: vec![PromptMessage {
                role: PromptMessageRole::User,
                content: PromptMessageContent::text(prompt_text),
            }],
        })
    }
}

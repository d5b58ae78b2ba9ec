//! MCP (Model Context Protocol) server implementation.
//!
//! Exposes the stateless text operations (occurrence search, context
//! extraction, replacement) over stdio so assistants can reuse the same
//! whole-word rules as the interactive reviewer.
//!
//! Each `#[tool]` method delegates to `spellreview_core` and returns pretty
//! JSON.

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;

use spellreview_core::replace::ReplaceMode;
use spellreview_core::scanner::{BoundaryPolicy, Scanner};

/// Parameters for the `get_info` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct GetInfoParams {
    /// Output format: "text" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "text".to_string()
}

/// Parameters for the `locate_occurrences` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct LocateOccurrencesParams {
    /// The text to search.
    pub text: String,
    /// The word to find (case-sensitive).
    pub word: String,
    /// Boundary policy; the server's configured policy when omitted.
    pub boundary: Option<BoundaryPolicy>,
}

/// Parameters for the `extract_context` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ExtractContextParams {
    /// The text containing the word.
    pub text: String,
    /// The word to show.
    pub word: String,
    /// 1-based occurrence number.
    pub occurrence: usize,
    /// Also render the context as HTML.
    #[serde(default)]
    pub html: bool,
    /// Boundary policy; the server's configured policy when omitted.
    pub boundary: Option<BoundaryPolicy>,
}

/// Parameters for the `apply_replacement` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ApplyReplacementParams {
    /// The text to edit.
    pub text: String,
    /// The word to replace.
    pub word: String,
    /// Replacement text.
    pub replacement: String,
    /// 1-based occurrence to replace. Ignored when `all` is true.
    pub occurrence: Option<usize>,
    /// Replace every occurrence.
    #[serde(default)]
    pub all: bool,
    /// Boundary policy; the server's configured policy when omitted.
    pub boundary: Option<BoundaryPolicy>,
}

#[derive(Serialize)]
struct LocateReport<'a> {
    word: &'a str,
    count: usize,
    occurrences: Vec<spellreview_core::scanner::Occurrence>,
}

#[derive(Serialize)]
struct ReplaceReport {
    replaced: usize,
    text: String,
}

/// MCP server exposing spellreview's text operations.
#[derive(Clone)]
pub struct ProjectServer {
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
    scanner: Scanner,
    max_input_bytes: Option<usize>,
}

impl Default for ProjectServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl ProjectServer {
    /// Create a server with the default scanner and input limit.
    pub fn new() -> Self {
        Self::with_scanner(
            Scanner::default(),
            Some(spellreview_core::DEFAULT_MAX_INPUT_BYTES),
        )
    }

    /// Create a server using `scanner` unless a call names a boundary.
    pub fn with_scanner(scanner: Scanner, max_input_bytes: Option<usize>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            scanner,
            max_input_bytes,
        }
    }

    fn check_input(&self, text: &str) -> Result<(), McpError> {
        match self.max_input_bytes {
            Some(max) if text.len() > max => Err(McpError::invalid_params(
                format!("input too large: {} bytes (limit: {max} bytes)", text.len()),
                None,
            )),
            _ => Ok(()),
        }
    }

    fn scanner_for(&self, boundary: Option<BoundaryPolicy>) -> Scanner {
        boundary.map_or(self.scanner, |policy| {
            Scanner::new(policy, self.scanner.window())
        })
    }

    /// Get project information.
    #[tool(description = "Get project name, version, and description")]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    fn get_info(
        &self,
        Parameters(params): Parameters<GetInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_info", format = %params.format, "executing MCP tool");

        let info = serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
        });

        let text = if params.format == "json" {
            serde_json::to_string_pretty(&info)
                .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?
        } else {
            format!(
                "{} v{}\n{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_DESCRIPTION"),
            )
        };

        tracing::info!(tool = "get_info", "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Find whole-word occurrences of a word.
    #[tool(
        description = "Locate whole-word occurrences of a word in text. A match must not be followed by a letter, digit, or underscore. Returns byte offsets and 1-based occurrence numbers."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server", word = %params.word))]
    fn locate_occurrences(
        &self,
        Parameters(params): Parameters<LocateOccurrencesParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "locate_occurrences", "executing MCP tool");
        self.check_input(&params.text)?;
        let scanner = self.scanner_for(params.boundary);

        let occurrences = scanner.locate(&params.text, &params.word);
        let report = LocateReport {
            word: &params.word,
            count: occurrences.len(),
            occurrences,
        };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?;

        tracing::info!(
            tool = "locate_occurrences",
            count = report.count,
            "MCP tool completed"
        );
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// Show the text around one occurrence.
    #[tool(
        description = "Extract the context around the Nth whole-word occurrence of a word: up to 20 characters before and 50 after, trimmed to whole words."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server", word = %params.word))]
    fn extract_context(
        &self,
        Parameters(params): Parameters<ExtractContextParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(
            tool = "extract_context",
            occurrence = params.occurrence,
            "executing MCP tool"
        );
        self.check_input(&params.text)?;
        let scanner = self.scanner_for(params.boundary);

        let context = scanner
            .extract_context(&params.text, &params.word, params.occurrence)
            .ok_or_else(|| {
                McpError::invalid_params(
                    format!(
                        "occurrence {} of `{}` not found",
                        params.occurrence, params.word
                    ),
                    None,
                )
            })?;

        let mut value = serde_json::to_value(&context)
            .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?;
        if params.html {
            value["html"] = serde_json::Value::String(context.to_html());
        }
        let json = serde_json::to_string_pretty(&value)
            .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?;

        tracing::info!(tool = "extract_context", "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// Replace one or every occurrence of a word.
    #[tool(
        description = "Replace the Nth whole-word occurrence of a word, or every occurrence when `all` is true. Returns the new text and the number of replacements."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server", word = %params.word))]
    fn apply_replacement(
        &self,
        Parameters(params): Parameters<ApplyReplacementParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(
            tool = "apply_replacement",
            all = params.all,
            occurrence = ?params.occurrence,
            "executing MCP tool"
        );
        self.check_input(&params.text)?;
        let scanner = self.scanner_for(params.boundary);

        let (mode, target) = match (params.all, params.occurrence) {
            (true, _) => (ReplaceMode::All, 0),
            (false, Some(n)) if n > 0 => (ReplaceMode::Single, n),
            (false, _) => {
                return Err(McpError::invalid_params(
                    "pass `occurrence` (1-based) or set `all` to true",
                    None,
                ));
            }
        };

        let replaced = scanner.replace(
            &params.text,
            &params.word,
            &params.replacement,
            mode,
            target,
        );
        let report = ReplaceReport {
            replaced: replaced.replaced,
            text: replaced.text,
        };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?;

        tracing::info!(
            tool = "apply_replacement",
            replaced = report.replaced,
            "MCP tool completed"
        );
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_handler]
impl ServerHandler for ProjectServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "{} MCP server. Use the tools to find, show, and replace whole-word occurrences in text.",
                env!("CARGO_PKG_NAME"),
            )),
        }
    }
}

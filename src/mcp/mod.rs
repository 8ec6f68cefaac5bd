//! MCP (Model Context Protocol) server: the three read-only query tools
//! an AI coding agent calls over stdio (spec §6 "Query tool surface").
//!
//! Each tool resolves a `(file_path, symbol)` pair against the Store
//! through [`QueryEngine`], renders the result with [`format_markdown`],
//! and always returns success — errors are folded into the text body
//! (spec §7: "user-visible failure is always a single textual line
//! prefixed by tool name plus a brief reason; no stack traces").

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, Implementation, InitializeRequestParam, InitializeResult,
        ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    schemars,
    service::{RequestContext, RoleServer},
    tool, tool_handler, tool_router,
    ErrorData as McpError, ServerHandler,
};
use serde::{Deserialize, Serialize};

use crate::formatter::{format_markdown, FormatInput};
use crate::query::QueryEngine;

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct SymbolLocation {
    /// Path to the file, relative to the project root.
    pub file_path: String,
    /// Exact symbol name within that file.
    pub symbol: String,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct DependenciesOfRequest {
    pub file_path: String,
    pub symbol: String,
    /// When set, prunes the result to branches that reach something
    /// relevant to this free-text topic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct PathsBetweenRequest {
    pub from: SymbolLocation,
    pub to: SymbolLocation,
}

#[derive(Clone)]
pub struct CodeGraphServer {
    query: Arc<QueryEngine>,
    project_root: PathBuf,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl CodeGraphServer {
    pub fn new(query: Arc<QueryEngine>, project_root: PathBuf) -> Self {
        Self {
            query,
            project_root,
            tool_router: Self::tool_router(),
        }
    }

    fn read_file(&self, relative_path: &str) -> Option<String> {
        std::fs::read_to_string(self.project_root.join(relative_path)).ok()
    }

    #[tool(
        description = "List everything a symbol depends on: functions it calls, types it references, extends, or implements. Optionally pass `topic` to prune the result to branches relevant to a free-text topic."
    )]
    pub async fn dependencies_of(
        &self,
        Parameters(req): Parameters<DependenciesOfRequest>,
    ) -> Result<CallToolResult, McpError> {
        let text = match self
            .query
            .dependencies_of(&req.file_path, &req.symbol, req.topic.as_deref())
        {
            Ok(traversal) => match self.query.load_nodes(&traversal.reachability) {
                Ok(nodes) => {
                    let input = FormatInput {
                        nodes: &nodes,
                        edges: &traversal.reachability.edges,
                        start: Some(&traversal.start),
                    };
                    format_markdown(&input, |p| self.read_file(p))
                }
                Err(e) => format!("dependencies_of: {e}"),
            },
            Err(e) => format!("dependencies_of: {e}"),
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        description = "List everything that depends on a symbol: callers, and types/classes that reference, extend, or implement it. Optionally pass `topic` to prune the result to branches relevant to a free-text topic."
    )]
    pub async fn dependents_of(
        &self,
        Parameters(req): Parameters<DependenciesOfRequest>,
    ) -> Result<CallToolResult, McpError> {
        let text = match self
            .query
            .dependents_of(&req.file_path, &req.symbol, req.topic.as_deref())
        {
            Ok(traversal) => match self.query.load_nodes(&traversal.reachability) {
                Ok(nodes) => {
                    let input = FormatInput {
                        nodes: &nodes,
                        edges: &traversal.reachability.edges,
                        start: Some(&traversal.start),
                    };
                    format_markdown(&input, |p| self.read_file(p))
                }
                Err(e) => format!("dependents_of: {e}"),
            },
            Err(e) => format!("dependents_of: {e}"),
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        description = "Find the shortest dependency path between two symbols, direction-agnostic."
    )]
    pub async fn paths_between(
        &self,
        Parameters(req): Parameters<PathsBetweenRequest>,
    ) -> Result<CallToolResult, McpError> {
        let text = match self.query.paths_between(
            (&req.from.file_path, &req.from.symbol),
            (&req.to.file_path, &req.to.symbol),
        ) {
            Ok(path) => match self.query.load_path_nodes(&path) {
                Ok(nodes) => {
                    let start = path.nodes.first().cloned();
                    let input = FormatInput {
                        nodes: &nodes,
                        edges: &path.edges,
                        start: start.as_deref(),
                    };
                    format_markdown(&input, |p| self.read_file(p))
                }
                Err(e) => format!("paths_between: {e}"),
            },
            Err(e) => format!("paths_between: {e}"),
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool_handler]
impl ServerHandler for CodeGraphServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "codetrace-engine".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Code Graph Query Server".to_string()),
                website_url: None,
                icons: None,
            },
            instructions: Some(
                "Query the indexed JS/TS code graph for this project. Use `dependencies_of` \
                to see what a symbol calls or references, `dependents_of` to see what calls or \
                references it, and `paths_between` to find the shortest dependency chain \
                connecting two symbols."
                    .to_string(),
            ),
        }
    }

    async fn initialize(
        &self,
        request: InitializeRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, McpError> {
        if context.peer.peer_info().is_none() {
            context.peer.set_peer_info(request);
        }
        Ok(self.get_info())
    }
}

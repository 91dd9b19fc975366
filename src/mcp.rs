use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::commands::extract::extract_file;
use crate::commands::info::{inspect, PageSummary};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfExtractRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(
        description = "Zero-based page indices in output order; repeats produce duplicate pages (e.g., [2, 0, 0])"
    )]
    pub pages: Vec<usize>,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

fn error_text(tool: &str, err: anyhow::Error) -> String {
    warn!(tool = tool, error = %format!("{:#}", err), "tool failed");
    format!("Error: {:#}", err)
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get PDF metadata and the list of pages (zero-based indices, media box, content stream and resource counts)")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        match inspect(&path) {
            Ok(summary) => {
                let info = summary.info;
                let result = PdfInfoResult {
                    path,
                    version: summary.version,
                    object_count: summary.object_count,
                    page_count: summary.pages.len(),
                    title: info.title,
                    author: info.author,
                    creator: info.creator,
                    producer: info.producer,
                    creation_date: info.creation_date,
                    subject: info.subject,
                    pages: summary.pages,
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => error_text("pdf_info", e),
        }
    }

    #[tool(description = "Copy the given zero-based pages, in the given order, from a PDF into a new PDF file")]
    fn pdf_extract(&self, Parameters(req): Parameters<PdfExtractRequest>) -> String {
        match extract_file(&req.path, req.pages.into_iter().collect(), &req.output) {
            Ok(page_count) => {
                let result = ExtractResult {
                    output_path: req.output,
                    page_count,
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => error_text("pdf_extract", e),
        }
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize)]
pub struct PdfInfoResult {
    pub path: String,
    pub version: String,
    pub object_count: usize,
    pub page_count: usize,
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub subject: Option<String>,
    pub pages: Vec<PageSummary>,
}

#[derive(Debug, Serialize)]
pub struct ExtractResult {
    pub output_path: String,
    pub page_count: usize,
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF page subset tools. Use pdf_info to see a document's pages (indices are \
                 zero-based), then pdf_extract to write a new PDF holding the chosen pages in \
                 the chosen order."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = PdfServer::new();

    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}

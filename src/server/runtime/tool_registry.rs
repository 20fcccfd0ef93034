use std::sync::Arc;

use rmcp::{
    handler::server::{wrapper::Parameters, ServerHandler},
    model::{ErrorData, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, Json,
};

use crate::tools::{
    self,
    leettools::{
        AddLocalToKbRequest, CommandResult, CreateKbRequest, ExtractRequest, KbSearchRequest,
        LeetTools, ToolRequest, WebSearchRequest,
    },
    ServerToolRouter,
};

#[derive(Clone)]
pub struct LeetToolsServer {
    tools: LeetTools,
    instructions: Arc<String>,
    tool_router: ServerToolRouter<Self>,
}

impl LeetToolsServer {
    pub fn new(tools: LeetTools, instructions: String) -> Self {
        let router = tools::build_router(Self::tool_router);
        Self {
            tools,
            instructions: Arc::new(instructions),
            tool_router: router,
        }
    }

    pub fn tools(&self) -> &LeetTools {
        &self.tools
    }

    async fn dispatch(&self, request: ToolRequest) -> Result<Json<CommandResult>, ErrorData> {
        self.tools.run(request).await.map(Json)
    }
}

#[tool_router(router = tool_router)]
impl LeetToolsServer {
    #[tool(
        name = "web_search",
        description = "Search the web for information on a topic using LeetTools"
    )]
    async fn web_search(
        &self,
        Parameters(request): Parameters<WebSearchRequest>,
    ) -> Result<Json<CommandResult>, ErrorData> {
        self.dispatch(ToolRequest::WebSearch(request)).await
    }

    #[tool(
        name = "kb_search",
        description = "Search a local knowledge base for information on a topic"
    )]
    async fn kb_search(
        &self,
        Parameters(request): Parameters<KbSearchRequest>,
    ) -> Result<Json<CommandResult>, ErrorData> {
        self.dispatch(ToolRequest::KbSearch(request)).await
    }

    #[tool(
        name = "list_kb",
        description = "List all local knowledge bases (Org, KB and ID per entry)"
    )]
    async fn list_kb(&self) -> Result<Json<CommandResult>, ErrorData> {
        self.dispatch(ToolRequest::ListKb).await
    }

    #[tool(name = "create_kb", description = "Create a local knowledge base")]
    async fn create_kb(
        &self,
        Parameters(request): Parameters<CreateKbRequest>,
    ) -> Result<Json<CommandResult>, ErrorData> {
        self.dispatch(ToolRequest::CreateKb(request)).await
    }

    #[tool(
        name = "add_local_to_kb",
        description = "Add files in a local folder to a knowledge base"
    )]
    async fn add_local_to_kb(
        &self,
        Parameters(request): Parameters<AddLocalToKbRequest>,
    ) -> Result<Json<CommandResult>, ErrorData> {
        self.dispatch(ToolRequest::AddLocalToKb(request)).await
    }

    #[tool(
        name = "extract",
        description = "Extract structured data from a knowledge base using a Pydantic model file"
    )]
    async fn extract(
        &self,
        Parameters(request): Parameters<ExtractRequest>,
    ) -> Result<Json<CommandResult>, ErrorData> {
        self.dispatch(ToolRequest::Extract(request)).await
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for LeetToolsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some((*self.instructions).clone()),
            ..ServerInfo::default()
        }
    }
}

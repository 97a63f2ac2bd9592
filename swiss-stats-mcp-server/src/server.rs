use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::env;
use swiss_stats::{
    Backend, DatasetRef, Filter, ObservationOptions, StatsClient, StatsConfig, StatsError,
};
use thiserror::Error;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

const METHODS: &[&str] = &[
    "initialize",
    "initialized",
    "shutdown",
    "tools/list",
    "stats.pxDimensions",
    "stats.pxObservations",
    "stats.sdmxDimensions",
    "stats.sdmxObservations",
];

pub struct SwissStatsMcpServer {
    stats: StatsClient,
}

impl SwissStatsMcpServer {
    pub async fn bootstrap() -> Result<(), ServerError> {
        let server = Self::new()?;
        server.run().await
    }

    fn new() -> Result<Self, ServerError> {
        let px_base_url = env::var("SWISS_STATS_PX_BASE_URL").ok();
        let sdmx_base_url = env::var("SWISS_STATS_SDMX_BASE_URL").ok();
        let user_agent = env::var("SWISS_STATS_USER_AGENT").ok();

        let mut config = StatsConfig::new();
        if let Some(url) = px_base_url {
            config = config.with_px_base_url(url);
        }
        if let Some(url) = sdmx_base_url {
            config = config.with_sdmx_base_url(url);
        }
        if let Some(ua) = user_agent {
            config = config.with_user_agent(ua);
        }
        let stats = StatsClient::with_config(config)?;

        Ok(Self { stats })
    }

    async fn run(self) -> Result<(), ServerError> {
        let stdin = io::stdin();
        let stdout = io::stdout();

        let reader = BufReader::new(stdin);
        let mut writer = BufWriter::new(stdout);

        self.send_ready(&mut writer).await?;

        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let request = match serde_json::from_str::<Request>(trimmed) {
                Ok(request) => request,
                Err(err) => {
                    tracing::warn!("invalid request: {err}");
                    let response =
                        Response::error(None, ServerError::InvalidRequest(err.to_string()));
                    self.write_response(&mut writer, &response).await?;
                    continue;
                }
            };

            let response = self.handle_request(request).await;
            self.write_response(&mut writer, &response).await?;
        }

        Ok(())
    }

    async fn send_ready(&self, writer: &mut BufWriter<io::Stdout>) -> Result<(), ServerError> {
        let ready = json!({
            "jsonrpc": "2.0",
            "id": null,
            "result": {
                "server": "swiss-stats-mcp-server",
                "version": env!("CARGO_PKG_VERSION"),
                "methods": METHODS,
            }
        });

        let payload = serde_json::to_string(&ready).map_err(ServerError::Serialization)?;
        writer.write_all(payload.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        tracing::info!("swiss-stats MCP server ready");
        Ok(())
    }

    async fn write_response(
        &self,
        writer: &mut BufWriter<io::Stdout>,
        response: &Response,
    ) -> Result<(), ServerError> {
        let payload = serde_json::to_string(response).map_err(ServerError::Serialization)?;
        writer.write_all(payload.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }

    async fn handle_request(&self, request: Request) -> Response {
        match self.dispatch(&request.method, request.params).await {
            Ok(result) => Response::success(request.id, result),
            Err(err) => Response::error(request.id, err),
        }
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, ServerError> {
        if method == "tools/call" {
            let params: CallToolParams = parse_required_params(method, params)?;
            let spec = find_tool_spec(&params.name)
                .ok_or_else(|| ServerError::InvalidMethod(params.name.clone()))?;

            let value = self.invoke_method(spec.method_name, params.arguments).await?;
            let response = ToolResponse::from_value(value);
            return serde_json::to_value(response).map_err(ServerError::Serialization);
        }

        if find_tool_spec_by_method(method).is_some() {
            let value = self.invoke_method(method, params).await?;
            let response = ToolResponse::from_value(value);
            return serde_json::to_value(response).map_err(ServerError::Serialization);
        }

        self.invoke_method(method, params).await
    }

    async fn invoke_method(&self, method: &str, params: Option<Value>) -> Result<Value, ServerError> {
        match method {
            "initialize" => {
                let params: InitializeParams = parse_optional_params(method, params)?;
                let result = InitializeResult::new(params.client_info);
                Ok(serde_json::to_value(result).map_err(ServerError::Serialization)?)
            }
            "initialized" => Ok(Value::Null),
            "shutdown" => Ok(Value::Null),
            "tools/list" => {
                let params: ListToolsParams = parse_optional_params(method, params)?;
                let _ = params.cursor;
                let result = ListToolsResult {
                    tools: tool_descriptors(),
                    next_cursor: None,
                };
                Ok(serde_json::to_value(result).map_err(ServerError::Serialization)?)
            }
            "stats.pxDimensions" => {
                let params: DimensionsParams = parse_required_params(method, params)?;
                let dataset =
                    DatasetRef::new(&params.dataset_id, Backend::Tabular, &params.language)?;
                let result = self.stats.dimensions(&dataset).await?;
                Ok(serde_json::to_value(result).map_err(ServerError::Serialization)?)
            }
            "stats.pxObservations" => {
                let params: PxObservationsParams = parse_required_params(method, params)?;
                let dataset =
                    DatasetRef::new(&params.dataset_id, Backend::Tabular, &params.language)?;
                let options = ObservationOptions {
                    format: params.format,
                    ..Default::default()
                };
                let result = self
                    .stats
                    .observations(&dataset, params.filter.as_ref(), &options)
                    .await?;
                Ok(serde_json::to_value(result).map_err(ServerError::Serialization)?)
            }
            "stats.sdmxDimensions" => {
                let params: DimensionsParams = parse_required_params(method, params)?;
                let dataset =
                    DatasetRef::new(&params.dataset_id, Backend::Timeseries, &params.language)?;
                let result = self.stats.dimensions(&dataset).await?;
                Ok(serde_json::to_value(result).map_err(ServerError::Serialization)?)
            }
            "stats.sdmxObservations" => {
                let params: SdmxObservationsParams = parse_required_params(method, params)?;
                let dataset =
                    DatasetRef::new(&params.dataset_id, Backend::Timeseries, &params.language)?;
                let options = ObservationOptions {
                    format: None,
                    start_period: params.start_period,
                    end_period: params.end_period,
                };
                let result = self
                    .stats
                    .observations(&dataset, params.filter.as_ref(), &options)
                    .await?;
                Ok(serde_json::to_value(result).map_err(ServerError::Serialization)?)
            }
            other => Err(ServerError::InvalidMethod(other.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    _jsonrpc: Option<String>,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Serialize)]
struct Response {
    jsonrpc: &'static str,
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ResponseError>,
}

impl Response {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Option<Value>, error: ServerError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(ResponseError::from(error)),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl From<ServerError> for ResponseError {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(message) => Self {
                code: -32600,
                message,
                data: None,
            },
            ServerError::InvalidMethod(method) => Self {
                code: -32601,
                message: format!("Unknown method: {method}"),
                data: None,
            },
            ServerError::InvalidParams(message) => Self {
                code: -32602,
                message,
                data: None,
            },
            ServerError::Json(err) => Self {
                code: -32700,
                message: err.to_string(),
                data: None,
            },
            ServerError::Io(err) => Self {
                code: -32020,
                message: err.to_string(),
                data: None,
            },
            ServerError::Stats(err) => {
                // Distinct codes so callers can offer targeted guidance:
                // "check your filter" reads differently from "slow down".
                let code = match &err {
                    StatsError::Validation { .. } => -32602,
                    StatsError::NotFound { .. } => -32001,
                    StatsError::RateLimited { .. } => -32002,
                    StatsError::Upstream { .. } => -32010,
                };
                Self {
                    code,
                    message: err.to_string(),
                    data: None,
                }
            }
            ServerError::Serialization(err) => Self {
                code: -32603,
                message: err.to_string(),
                data: None,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unknown method: {0}")]
    InvalidMethod(String),
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error("serialization error: {0}")]
    Serialization(serde_json::Error),
}

type ServerResult<T> = Result<T, ServerError>;

fn parse_required_params<T>(method: &str, params: Option<Value>) -> ServerResult<T>
where
    T: DeserializeOwned,
{
    match params {
        Some(value) => serde_json::from_value(value)
            .map_err(|err| ServerError::InvalidParams(format!("{method}: {err}"))),
        None => Err(ServerError::InvalidParams(format!(
            "{method}: missing parameters"
        ))),
    }
}

fn parse_optional_params<T>(method: &str, params: Option<Value>) -> ServerResult<T>
where
    T: DeserializeOwned + Default,
{
    match params {
        Some(value) => serde_json::from_value(value)
            .map_err(|err| ServerError::InvalidParams(format!("{method}: {err}"))),
        None => Ok(T::default()),
    }
}

#[derive(Debug, Deserialize)]
struct DimensionsParams {
    #[serde(rename = "datasetId")]
    dataset_id: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct PxObservationsParams {
    #[serde(rename = "datasetId")]
    dataset_id: String,
    language: String,
    #[serde(default)]
    filter: Option<Filter>,
    #[serde(default)]
    format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SdmxObservationsParams {
    #[serde(rename = "datasetId")]
    dataset_id: String,
    language: String,
    #[serde(default)]
    filter: Option<Filter>,
    #[serde(default, rename = "startPeriod")]
    start_period: Option<String>,
    #[serde(default, rename = "endPeriod")]
    end_period: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct InitializeParams {
    #[serde(default, rename = "clientInfo")]
    client_info: Option<ClientInfo>,
}

#[derive(Debug, Deserialize)]
struct ClientInfo {
    name: String,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Serialize)]
struct InitializeResult {
    #[serde(rename = "serverInfo")]
    server_info: ServerInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    capabilities: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "clientInfo")]
    client_info: Option<ClientInfoSummary>,
}

impl InitializeResult {
    fn new(client_info: Option<ClientInfo>) -> Self {
        let client_info = client_info.map(|info| ClientInfoSummary {
            name: info.name,
            version: info.version,
        });

        Self {
            server_info: ServerInfo {
                name: "swiss-stats-mcp-server",
                version: env!("CARGO_PKG_VERSION"),
            },
            capabilities: Some(json!({
                "tools": {
                    "list": true
                }
            })),
            client_info,
        }
    }
}

#[derive(Debug, Serialize)]
struct ServerInfo {
    name: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ClientInfoSummary {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListToolsParams {
    #[serde(default, rename = "cursor")]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ToolSpec {
    tool_name: &'static str,
    method_name: &'static str,
    description: &'static str,
    input_schema: Value,
}

#[derive(Debug, Serialize)]
struct ListToolsResult {
    tools: Vec<ToolDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "nextCursor")]
    next_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
struct ToolDescriptor {
    name: &'static str,
    description: &'static str,
    #[serde(rename = "inputSchema")]
    input_schema: Value,
}

#[derive(Debug, Serialize)]
struct ToolResponse {
    content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "isError")]
    is_error: Option<bool>,
}

impl ToolResponse {
    fn from_value(value: Value) -> Self {
        let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
        Self {
            content: vec![
                ToolContent::Text { text },
                ToolContent::Json { json: value },
            ],
            is_error: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ToolContent {
    #[serde(rename = "json")]
    Json { json: Value },
    #[serde(rename = "text")]
    Text { text: String },
}

fn tool_descriptors() -> Vec<ToolDescriptor> {
    tool_specs()
        .into_iter()
        .map(|spec| ToolDescriptor {
            name: spec.tool_name,
            description: spec.description,
            input_schema: spec.input_schema,
        })
        .collect()
}

fn find_tool_spec(name: &str) -> Option<ToolSpec> {
    tool_specs().into_iter().find(|spec| spec.tool_name == name)
}

fn find_tool_spec_by_method(method: &str) -> Option<ToolSpec> {
    tool_specs()
        .into_iter()
        .find(|spec| spec.method_name == method)
}

fn filter_schema() -> Value {
    json!({
        "type": ["object", "null"],
        "description": "Dimension code to selected value code(s); a bare string is treated as a one-element selection. Omit to select everything.",
        "additionalProperties": {
            "anyOf": [
                {"type": "string"},
                {"type": "array", "items": {"type": "string"}}
            ]
        }
    })
}

fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            tool_name: "stats_px_dimensions",
            method_name: "stats.pxDimensions",
            description: "List the dimensions of a tabular (PxWeb) dataset with their permitted values",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "datasetId": {"type": "string", "description": "Table identifier, e.g. px-x-0102020000_101"},
                    "language": {"type": "string", "enum": ["de", "fr", "it", "en"], "description": "Publication language"}
                },
                "required": ["datasetId", "language"],
                "additionalProperties": false
            }),
        },
        ToolSpec {
            tool_name: "stats_px_observations",
            method_name: "stats.pxObservations",
            description: "Fetch data from a tabular (PxWeb) dataset, optionally filtered, in the requested response format",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "datasetId": {"type": "string", "description": "Table identifier"},
                    "language": {"type": "string", "enum": ["de", "fr", "it", "en"], "description": "Publication language"},
                    "filter": filter_schema(),
                    "format": {"type": "string", "enum": ["json-stat2", "json", "csv"], "description": "Upstream response format (default json-stat2)"}
                },
                "required": ["datasetId", "language"],
                "additionalProperties": false
            }),
        },
        ToolSpec {
            tool_name: "stats_sdmx_dimensions",
            method_name: "stats.sdmxDimensions",
            description: "List the dimensions of a time-series (SDMX) dataset with their permitted values",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "datasetId": {"type": "string", "description": "Dataflow identifier, e.g. DF_POPULATION"},
                    "language": {"type": "string", "enum": ["de", "fr", "it", "en"], "description": "Publication language"}
                },
                "required": ["datasetId", "language"],
                "additionalProperties": false
            }),
        },
        ToolSpec {
            tool_name: "stats_sdmx_observations",
            method_name: "stats.sdmxObservations",
            description: "Fetch normalized observations from a time-series (SDMX) dataset, optionally filtered and bounded to a time range",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "datasetId": {"type": "string", "description": "Dataflow identifier"},
                    "language": {"type": "string", "enum": ["de", "fr", "it", "en"], "description": "Publication language"},
                    "filter": filter_schema(),
                    "startPeriod": {"type": ["string", "null"], "description": "Inclusive start of the time range, e.g. 2019"},
                    "endPeriod": {"type": ["string", "null"], "description": "Inclusive end of the time range, e.g. 2021"}
                },
                "required": ["datasetId", "language"],
                "additionalProperties": false
            }),
        },
    ]
}

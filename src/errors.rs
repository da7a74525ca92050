use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum GeoProxyError {
    Config(String),
    CacheConnection(String),
    CachePluginNotFound(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Upstream(String),
    Decode(String),
    InvalidAddress(String),
    NoServiceAvailable(String),
    Serialization(String),
    FileOperation(String),
}

impl GeoProxyError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            GeoProxyError::Config(_) => "E001",
            GeoProxyError::CacheConnection(_) => "E002",
            GeoProxyError::CachePluginNotFound(_) => "E003",
            GeoProxyError::DatabaseConnection(_) => "E004",
            GeoProxyError::DatabaseOperation(_) => "E005",
            GeoProxyError::Upstream(_) => "E006",
            GeoProxyError::Decode(_) => "E007",
            GeoProxyError::InvalidAddress(_) => "E008",
            GeoProxyError::NoServiceAvailable(_) => "E009",
            GeoProxyError::Serialization(_) => "E010",
            GeoProxyError::FileOperation(_) => "E011",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            GeoProxyError::Config(_) => "Configuration Error",
            GeoProxyError::CacheConnection(_) => "Cache Connection Error",
            GeoProxyError::CachePluginNotFound(_) => "Cache Plugin Not Found",
            GeoProxyError::DatabaseConnection(_) => "Database Connection Error",
            GeoProxyError::DatabaseOperation(_) => "Database Operation Error",
            GeoProxyError::Upstream(_) => "Upstream Lookup Error",
            GeoProxyError::Decode(_) => "Reply Decode Error",
            GeoProxyError::InvalidAddress(_) => "Invalid Client Address",
            GeoProxyError::NoServiceAvailable(_) => "No Service Available",
            GeoProxyError::Serialization(_) => "Serialization Error",
            GeoProxyError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            GeoProxyError::Config(msg) => msg,
            GeoProxyError::CacheConnection(msg) => msg,
            GeoProxyError::CachePluginNotFound(msg) => msg,
            GeoProxyError::DatabaseConnection(msg) => msg,
            GeoProxyError::DatabaseOperation(msg) => msg,
            GeoProxyError::Upstream(msg) => msg,
            GeoProxyError::Decode(msg) => msg,
            GeoProxyError::InvalidAddress(msg) => msg,
            GeoProxyError::NoServiceAvailable(msg) => msg,
            GeoProxyError::Serialization(msg) => msg,
            GeoProxyError::FileOperation(msg) => msg,
        }
    }

    /// 对外返回的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            GeoProxyError::NoServiceAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GeoProxyError::Upstream(_) | GeoProxyError::Decode(_) => StatusCode::BAD_GATEWAY,
            GeoProxyError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于启动失败时打印到终端）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for GeoProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for GeoProxyError {}

// 便捷的构造函数
impl GeoProxyError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        GeoProxyError::Config(msg.into())
    }

    pub fn cache_connection<T: Into<String>>(msg: T) -> Self {
        GeoProxyError::CacheConnection(msg.into())
    }

    pub fn cache_plugin_not_found<T: Into<String>>(msg: T) -> Self {
        GeoProxyError::CachePluginNotFound(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        GeoProxyError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        GeoProxyError::DatabaseOperation(msg.into())
    }

    pub fn upstream<T: Into<String>>(msg: T) -> Self {
        GeoProxyError::Upstream(msg.into())
    }

    pub fn decode<T: Into<String>>(msg: T) -> Self {
        GeoProxyError::Decode(msg.into())
    }

    pub fn invalid_address<T: Into<String>>(msg: T) -> Self {
        GeoProxyError::InvalidAddress(msg.into())
    }

    pub fn no_service_available<T: Into<String>>(msg: T) -> Self {
        GeoProxyError::NoServiceAvailable(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        GeoProxyError::Serialization(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        GeoProxyError::FileOperation(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for GeoProxyError {
    fn from(err: sea_orm::DbErr) -> Self {
        GeoProxyError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for GeoProxyError {
    fn from(err: std::io::Error) -> Self {
        GeoProxyError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for GeoProxyError {
    fn from(err: serde_json::Error) -> Self {
        GeoProxyError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for GeoProxyError {
    fn from(err: config::ConfigError) -> Self {
        GeoProxyError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeoProxyError>;

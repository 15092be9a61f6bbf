use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// PDF 输入目录
    pub input_dir: PathBuf,
    /// CSV 报告路径
    pub output_csv: PathBuf,
    /// 输出日志文件
    pub output_log_file: PathBuf,
    /// 字段定义文件（可选，缺省使用内置字段）
    pub schema_file: Option<PathBuf>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 分析服务配置 ---
    pub api_key: String,
    pub api_base_url: String,
    pub model_name: String,
    /// 单次 HTTP 请求超时
    pub request_timeout: Duration,
    /// 只分析前 N 页
    pub page_limit: u32,
    // --- 重试配置 ---
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./pdfs"),
            output_csv: PathBuf::from("extracted_data.csv"),
            output_log_file: PathBuf::from("pdf_processing.log"),
            schema_file: None,
            verbose_logging: false,
            api_key: String::new(),
            api_base_url: "https://api.openai.com/v1".to_string(),
            model_name: "gpt-4o".to_string(),
            request_timeout: Duration::from_secs(30),
            page_limit: 20,
            max_attempts: 3,
            backoff_base: Duration::from_millis(1000),
            backoff_max: Duration::from_millis(30_000),
        }
    }
}

impl Config {
    /// 从进程环境变量和当前目录下的 `.env` 文件读取配置
    ///
    /// `OPENAI_API_KEY` 必填，缺失或为空时直接返回错误。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_dotenv(Path::new(".env"))
    }

    /// 同 [`Config::from_env`]，`.env` 路径可指定
    ///
    /// 进程环境变量优先，`.env` 中的值只补充缺失的变量；文件不存在时忽略。
    pub fn from_env_with_dotenv(dotenv_path: &Path) -> Result<Self, ConfigError> {
        let file_vars = read_dotenv(dotenv_path)?;
        Self::from_lookup(|name| std::env::var(name).ok().or_else(|| file_vars.get(name).cloned()))
    }

    /// 从任意键值来源读取配置（测试中用闭包代替真实环境）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        let api_key = lookup("OPENAI_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::EnvVarNotFound {
                var_name: "OPENAI_API_KEY".to_string(),
            })?;

        let max_attempts: u32 = parse_var(&lookup, "MAX_ATTEMPTS", "正整数")?.unwrap_or(default.max_attempts);
        let page_limit: u32 = parse_var(&lookup, "PAGE_LIMIT", "正整数")?.unwrap_or(default.page_limit);
        non_zero(&lookup, "MAX_ATTEMPTS", max_attempts)?;
        non_zero(&lookup, "PAGE_LIMIT", page_limit)?;

        Ok(Self {
            input_dir: lookup("PDF_INPUT_DIR").map(PathBuf::from).unwrap_or(default.input_dir),
            output_csv: lookup("OUTPUT_CSV").map(PathBuf::from).unwrap_or(default.output_csv),
            output_log_file: lookup("OUTPUT_LOG_FILE").map(PathBuf::from).unwrap_or(default.output_log_file),
            schema_file: lookup("SCHEMA_FILE").filter(|v| !v.trim().is_empty()).map(PathBuf::from),
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING", "bool")?.unwrap_or(default.verbose_logging),
            api_key,
            api_base_url: lookup("OPENAI_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(default.api_base_url),
            model_name: lookup("EXTRACTION_MODEL").unwrap_or(default.model_name),
            request_timeout: parse_var(&lookup, "REQUEST_TIMEOUT_SECS", "秒数")?
                .map(Duration::from_secs)
                .unwrap_or(default.request_timeout),
            page_limit,
            max_attempts,
            backoff_base: parse_var(&lookup, "BACKOFF_BASE_MS", "毫秒数")?
                .map(Duration::from_millis)
                .unwrap_or(default.backoff_base),
            backoff_max: parse_var(&lookup, "BACKOFF_MAX_MS", "毫秒数")?
                .map(Duration::from_millis)
                .unwrap_or(default.backoff_max),
        })
    }
}

/// 读取 `.env` 文件中的键值对
fn read_dotenv(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let dotenv_error = |source| ConfigError::Dotenv {
        path: path.to_path_buf(),
        source,
    };

    match dotenvy::from_path_iter(path) {
        Ok(iter) => iter.collect::<Result<HashMap<_, _>, _>>().map_err(dotenv_error),
        Err(e) if e.not_found() => Ok(HashMap::new()),
        Err(e) => Err(dotenv_error(e)),
    }
}

/// 解析可选的环境变量；存在但无法解析时报错
fn parse_var<F, T>(lookup: &F, var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var_name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value: raw,
                expected_type: expected_type.to_string(),
            }),
    }
}

fn non_zero<F>(lookup: &F, var_name: &str, value: u32) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if value == 0 {
        return Err(ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: lookup(var_name).unwrap_or_default(),
            expected_type: "正整数".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_api_key_fails() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotFound { ref var_name } if var_name == "OPENAI_API_KEY"));
    }

    #[test]
    fn test_blank_api_key_fails() {
        let err = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotFound { .. }));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.page_limit, 20);
        assert_eq!(config.input_dir, PathBuf::from("./pdfs"));
        assert_eq!(config.output_csv, PathBuf::from("extracted_data.csv"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.schema_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
            ("MAX_ATTEMPTS", "5"),
            ("PAGE_LIMIT", "3"),
            ("BACKOFF_BASE_MS", "10"),
            ("VERBOSE_LOGGING", "true"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080/v1");
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.page_limit, 3);
        assert_eq!(config.backoff_base, Duration::from_millis(10));
        assert!(config.verbose_logging);
    }

    #[test]
    fn test_invalid_number_fails() {
        let err = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("MAX_ATTEMPTS", "three"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarParseFailed { ref var_name, .. } if var_name == "MAX_ATTEMPTS"));
    }

    #[test]
    fn test_read_dotenv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "# credentials\nOPENAI_API_KEY=sk-from-dotenv\nPAGE_LIMIT=7\n").unwrap();

        let vars = read_dotenv(&path).unwrap();
        assert_eq!(vars.get("OPENAI_API_KEY").map(String::as_str), Some("sk-from-dotenv"));
        assert_eq!(vars.get("PAGE_LIMIT").map(String::as_str), Some("7"));
    }

    #[test]
    fn test_missing_dotenv_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_dotenv(&dir.path().join(".env")).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_dotenv_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "OPENAI_API_KEY='unterminated\n").unwrap();

        assert!(matches!(read_dotenv(&path), Err(ConfigError::Dotenv { .. })));
    }

    #[test]
    fn test_from_env_picks_up_dotenv_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "OPENAI_API_KEY=sk-from-dotenv\nEXTRACTION_MODEL=dotenv-model\n",
        )
        .unwrap();

        let config = Config::from_env_with_dotenv(&path).unwrap();

        // 进程环境变量优先，只在未设置时检查 .env 中的值
        if std::env::var("OPENAI_API_KEY").is_err() {
            assert_eq!(config.api_key, "sk-from-dotenv");
        }
        if std::env::var("EXTRACTION_MODEL").is_err() {
            assert_eq!(config.model_name, "dotenv-model");
        }
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("MAX_ATTEMPTS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarParseFailed { .. }));
    }
}

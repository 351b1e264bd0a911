//! Настройки сервера

use std::net::SocketAddr;

use anyhow::Context;

use crate::types::BatchOptions;

pub const ADDR_ENV: &str = "AORISTIC_ADDR";
pub const SEQUENTIAL_ENV: &str = "AORISTIC_SEQUENTIAL";
const DEFAULT_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Настройки пакета по умолчанию, если запрос не передал свои
    pub batch: BatchOptions,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(
            std::env::var(ADDR_ENV).ok().as_deref(),
            std::env::var(SEQUENTIAL_ENV).ok().as_deref(),
        )
    }

    pub fn from_vars(addr: Option<&str>, sequential: Option<&str>) -> anyhow::Result<Self> {
        let addr = addr.unwrap_or(DEFAULT_ADDR);
        let addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("invalid {ADDR_ENV}: `{addr}`"))?;

        let sequential = matches!(sequential.map(str::trim), Some("1" | "true" | "yes"));

        Ok(Self {
            addr,
            batch: BatchOptions {
                parallel: !sequential,
            },
        })
    }
}

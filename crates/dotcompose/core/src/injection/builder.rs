// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Two-scope composition bootstrap

use crate::config::ComposeConfig;
use crate::injection::context::{ServiceContext, ServiceContextOptions};
use crate::injection::error::ComposeResult;
use crate::injection::service::Service;
use crate::logging::LogSink;
use std::any::Any;
use std::sync::Arc;

type Registration = Box<dyn FnOnce(&mut ServiceContext) -> ComposeResult<()> + Send>;

/// Builds a static scope of host-supplied values and a root scope of services chained to it
pub struct ComposerBuilder {
    config: ComposeConfig,
    logger: Option<Arc<dyn LogSink>>,
    statics: Vec<Registration>,
    services: Vec<Registration>,
}

impl Default for ComposerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ComposerBuilder {
    pub fn new() -> Self {
        Self {
            config: ComposeConfig::default(),
            logger: None,
            statics: Vec::new(),
            services: Vec::new(),
        }
    }

    pub fn config(mut self, config: ComposeConfig) -> Self {
        self.config = config;
        self
    }

    /// Sink for both scopes; takes precedence over `log_compose`
    pub fn logger(mut self, logger: Arc<dyn LogSink>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Adds a value to the static scope, e.g. a server handle under `$server`
    pub fn with_static<T: Any + Send + Sync>(mut self, key: impl Into<String>, instance: Arc<T>) -> Self {
        let key = key.into();
        self.statics.push(Box::new(move |ctx: &mut ServiceContext| ctx.add_static(key, instance).map(drop)));
        self
    }

    /// Adds a service to the root scope
    pub fn service<S, F>(mut self, construct: F) -> Self
    where
        S: Service,
        F: FnOnce() -> S + Send + 'static,
    {
        self.services.push(Box::new(move |ctx: &mut ServiceContext| ctx.add(construct).map(drop)));
        self
    }

    /// Registers everything, composes both scopes and returns the root
    pub async fn compose(self) -> ComposeResult<ServiceContext> {
        let options = ServiceContextOptions::from_config(&self.config);
        let options = match self.logger {
            Some(logger) => options.with_logger(logger),
            None => options,
        };

        let mut statics = ServiceContext::statics(Arc::clone(&options.logger));
        for register in self.statics {
            register(&mut statics)?;
        }
        statics.compose().await?;

        let mut root = ServiceContext::with_parent(options, Arc::new(statics));
        for register in self.services {
            register(&mut root)?;
        }
        root.compose().await?;

        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injection::error::ComposeError;
    use crate::injection::service::Injection;
    use crate::logging::NoopSink;

    struct Server {
        port: u16,
    }

    #[derive(Default)]
    struct Router {
        server: Option<Arc<Server>>,
    }

    impl Service for Router {
        fn injections() -> Vec<Injection<Self>> {
            vec![Injection::required("server", |r: &mut Router, server: Arc<Server>| r.server = Some(server)).service("$server")]
        }
    }

    #[tokio::test]
    async fn test_statics_reach_root_services() {
        let root = ComposerBuilder::new()
            .logger(Arc::new(NoopSink))
            .with_static("$server", Arc::new(Server { port: 8080 }))
            .service(Router::default)
            .compose()
            .await
            .unwrap();

        let router = root.get_typed::<Router>("Router").unwrap().unwrap();
        assert_eq!(router.server.as_ref().unwrap().port, 8080);

        assert!(root.get("$server").unwrap().is_none());
        assert!(root.parent().unwrap().get("$server").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_static_fails() {
        let error = ComposerBuilder::new().logger(Arc::new(NoopSink)).service(Router::default).compose().await.unwrap_err();
        assert!(matches!(error, ComposeError::Composition(_)));
    }
}

pub mod entity;
pub mod ids;
pub mod models;
use tokio::sync::OnceCell;

use std::{sync::Arc, time::Duration};

use iroh::Endpoint;
use tracing::info;
use zel_core::{prelude::RpcServerBuilder, protocol::RpcClient, IrohBundle};

use crate::service::comments::{CommentsClient, CommentsServer, CommentsService};

pub mod service;

pub mod error;

pub mod config;

pub mod logging;

pub mod threads;

pub mod view;

#[cfg(test)]
mod test_utils;

static THREADLY_CORE: OnceCell<Arc<ThreadlyCore>> = OnceCell::const_new();
static ALPN: &[u8] = b"threadly::0.1.0";

/// The process-wide runtime, started on first use.
pub async fn core() -> Result<Arc<ThreadlyCore>, Box<dyn std::error::Error>> {
    THREADLY_CORE
        .get_or_try_init(|| async move { ThreadlyCore::start().await.map(Arc::new) })
        .await
        .cloned()
}

/// Main runtime handle for Threadly.
pub struct ThreadlyCore {
    pub config: config::ThreadlyConfig,

    /// Server bundle that accepts inbound RPC traffic.
    pub server: IrohBundle,

    /// Client-side endpoint used to reach the local server.
    pub client_endpoint: Endpoint,

    /// Typed client for the local comments service.
    pub comments: CommentsClient,

    /// In-process handle, for hooks such as post deletion that run next to
    /// the database rather than over RPC.
    pub service: CommentsService,
}

impl ThreadlyCore {
    pub async fn start() -> Result<Self, Box<dyn std::error::Error>> {
        logging::init();

        let config = config::get_or_init().await?;
        info!(
            database = %config.database_path().display(),
            comments = ?config.comments,
            "loaded config"
        );
        // ----------------
        // Server endpoint
        // ----------------
        let mut server_builder = IrohBundle::builder(Some(config.secret_key.clone())).await?;
        let server_endpoint = server_builder.endpoint().clone();

        // DB + migrations
        let db = models::open_or_create_db(&config).await?;
        models::migrate_up(&db).await?;

        let comments_service = CommentsService::new(db, config.comments.clone());

        // Register RPC servers
        let rpc_server_builder = RpcServerBuilder::new(ALPN, server_endpoint.clone());

        let rpc_server_builder = comments_service.clone().register_service(rpc_server_builder);

        let rpc_server = rpc_server_builder.build();

        let server = server_builder.accept(ALPN, rpc_server).finish().await;

        server.wait_online().await;
        info!("comments server online");

        // ----------------
        // Client endpoint
        // ----------------
        let client_endpoint = Endpoint::builder()
            .secret_key(config.client_secret_key.clone())
            .alpns(vec![ALPN.to_vec()])
            .bind()
            .await?;

        client_endpoint.online().await;

        // Connect client endpoint -> server endpoint
        let conn = client_endpoint
            .connect(server.endpoint.addr(), ALPN)
            .await?;

        let rpc = RpcClient::new(conn).await?;
        let comments = CommentsClient::new(rpc);

        Ok(Self {
            config,
            server,
            client_endpoint,
            comments,
            service: comments_service,
        })
    }

    pub async fn shutdown(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("shutting down");

        // Close client endpoint
        self.client_endpoint.close().await;

        // Shutdown server bundle
        self.server.shutdown(Duration::from_secs(5)).await?;
        Ok(())
    }
}

pub mod prelude {
    pub use super::ids;
    pub use super::entity;
    pub use super::models;

    pub use super::service;
    pub use super::service::authz::Actor;
    pub use super::service::comments::{CommentsClient, CommentsService};

    pub use super::threads::{
        pagination::{Page, PageRequest},
        tree::{ThreadNode, TreeOrder},
    };
    pub use super::view::{CommentView, DeleteOutcome};

    pub use super::error;

    pub use super::config;

    pub use zel_core;
}

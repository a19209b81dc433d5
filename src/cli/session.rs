//! Blocking bridge from CLI commands to the async LCA service

use console::style;
use miette::{IntoDiagnostic, Result};
use std::future::Future;
use tokio::runtime::Runtime;

use crate::core::cancel::CancelToken;
use crate::core::categorize::CategoryTaxonomy;
use crate::core::host::HostContext;
use crate::service::{HttpLcaService, LcaService};

/// A current-thread runtime plus the HTTP client for one command invocation
pub struct ServiceSession {
    rt: Runtime,
    service: HttpLcaService,
}

impl ServiceSession {
    pub fn new(host: &HostContext) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .into_diagnostic()?;
        Ok(Self {
            rt,
            service: HttpLcaService::from_host(host),
        })
    }

    pub fn service(&self) -> &dyn LcaService {
        &self.service
    }

    pub fn base_url(&self) -> &str {
        self.service.base_url()
    }

    /// Drive `fut` to completion. Ctrl-C while it runs cancels `cancel`.
    pub fn block_on<F: Future>(&self, cancel: &CancelToken, fut: F) -> F::Output {
        let watcher = cancel.clone();
        self.rt.block_on(async move {
            let interrupt = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    watcher.cancel();
                }
            });
            let out = fut.await;
            interrupt.abort();
            out
        })
    }

    /// Fetch the category taxonomy; on failure fall back to free-text categories
    pub fn taxonomy(&self) -> CategoryTaxonomy {
        let cancel = CancelToken::new();
        let result = self.block_on(&cancel, async {
            tokio::select! {
                _ = cancel.cancelled() => None,
                r = self.service.product_categories() => Some(r),
            }
        });
        match result {
            Some(Ok(taxonomy)) => taxonomy,
            Some(Err(e)) => {
                eprintln!(
                    "{} Could not load product categories: {}",
                    style("!").yellow(),
                    e
                );
                CategoryTaxonomy::default()
            }
            None => CategoryTaxonomy::default(),
        }
    }
}

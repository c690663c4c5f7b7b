//! `execute_intention`: the single entry point of the engine.
//!
//! Resolution runs in a fixed order: registry lookup, handler presence,
//! required-param presence. All three are local checks, so a malformed
//! request never reaches a handler or the store. Only then is the handler
//! invoked, with panics caught and reported as `EXECUTION_ERROR`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;

use mediabuy_db::Store;

use super::registry::{HandlerKind, Intent, IntentDescriptor, Registry, RegistryError};
use crate::config::EngineSettings;
use crate::envelope::{ActionError, ActionResult, Envelope};
use crate::handlers::{
    CampaignHandler, ClientHandler, MediaHandler, OrderHandler, ProviderHandler,
};
use crate::params::{self, Params};

/// Routes intents to the handler instances it was built with.
pub struct Dispatcher {
    registry: Registry,
    clients: Option<ClientHandler>,
    providers: Option<ProviderHandler>,
    media: Option<MediaHandler>,
    campaigns: Option<CampaignHandler>,
    orders: Option<OrderHandler>,
}

/// Assembles a [`Dispatcher`] from a registry and any subset of handlers.
pub struct DispatcherBuilder {
    registry: Registry,
    clients: Option<ClientHandler>,
    providers: Option<ProviderHandler>,
    media: Option<MediaHandler>,
    campaigns: Option<CampaignHandler>,
    orders: Option<OrderHandler>,
}

impl DispatcherBuilder {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            clients: None,
            providers: None,
            media: None,
            campaigns: None,
            orders: None,
        }
    }

    /// Register all five handlers over one shared store.
    pub fn with_all_handlers(self, store: Arc<dyn Store>, settings: EngineSettings) -> Self {
        self.client(ClientHandler::new(Arc::clone(&store), settings))
            .provider(ProviderHandler::new(Arc::clone(&store), settings))
            .media(MediaHandler::new(Arc::clone(&store), settings))
            .campaign(CampaignHandler::new(Arc::clone(&store), settings))
            .order(OrderHandler::new(store, settings))
    }

    pub fn client(mut self, handler: ClientHandler) -> Self {
        self.clients = Some(handler);
        self
    }

    pub fn provider(mut self, handler: ProviderHandler) -> Self {
        self.providers = Some(handler);
        self
    }

    pub fn media(mut self, handler: MediaHandler) -> Self {
        self.media = Some(handler);
        self
    }

    pub fn campaign(mut self, handler: CampaignHandler) -> Self {
        self.campaigns = Some(handler);
        self
    }

    pub fn order(mut self, handler: OrderHandler) -> Self {
        self.orders = Some(handler);
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            registry: self.registry,
            clients: self.clients,
            providers: self.providers,
            media: self.media,
            campaigns: self.campaigns,
            orders: self.orders,
        }
    }
}

/// Unwrap an optional handler or fail with `HANDLER_NOT_FOUND`.
fn require<'h, H>(
    handler: &'h Option<H>,
    descriptor: &IntentDescriptor,
) -> Result<&'h H, ActionError> {
    handler.as_ref().ok_or_else(|| {
        ActionError::handler_not_found(descriptor.handler.as_str(), descriptor.name)
    })
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

impl Dispatcher {
    /// The built-in registry with every handler over `store`.
    pub fn new(store: Arc<dyn Store>, settings: EngineSettings) -> Result<Self, RegistryError> {
        Ok(DispatcherBuilder::new(Registry::builtin()?)
            .with_all_handlers(store, settings)
            .build())
    }

    pub fn builder(registry: Registry) -> DispatcherBuilder {
        DispatcherBuilder::new(registry)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn has_handler(&self, kind: HandlerKind) -> bool {
        match kind {
            HandlerKind::Client => self.clients.is_some(),
            HandlerKind::Provider => self.providers.is_some(),
            HandlerKind::Media => self.media.is_some(),
            HandlerKind::Campaign => self.campaigns.is_some(),
            HandlerKind::Order => self.orders.is_some(),
        }
    }

    /// Resolve and run one intent, always producing an envelope.
    pub async fn execute_intention(&self, intention: &str, params: Params) -> Envelope {
        let started = Instant::now();
        let outcome = self.resolve_and_run(intention, &params).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let handler = self
            .registry
            .get(intention)
            .map(|d| d.handler.as_str())
            .unwrap_or("-");

        match &outcome {
            Ok(_) => tracing::info!(intention, handler, code = "OK", elapsed_ms, "Intention executed"),
            Err(err) if err.kind.is_rejection() => tracing::warn!(
                intention,
                handler,
                code = err.kind.as_str(),
                elapsed_ms,
                error = %err.message,
                "Intention rejected"
            ),
            Err(err) => tracing::error!(
                intention,
                handler,
                code = err.kind.as_str(),
                elapsed_ms,
                error = %err.message,
                "Intention failed"
            ),
        }

        Envelope::from(outcome)
    }

    async fn resolve_and_run(&self, intention: &str, params: &Params) -> ActionResult {
        let descriptor = self
            .registry
            .get(intention)
            .ok_or_else(|| ActionError::unknown_intention(intention))?;

        if !self.has_handler(descriptor.handler) {
            return Err(ActionError::handler_not_found(
                descriptor.handler.as_str(),
                descriptor.name,
            ));
        }

        let missing = params::missing_params(params, descriptor.required_params);
        if !missing.is_empty() {
            return Err(ActionError::missing_params(missing));
        }

        AssertUnwindSafe(self.invoke(descriptor, params))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                let message = panic_message(payload);
                Err(ActionError::execution(format!(
                    "Unexpected failure while executing {}: {message}",
                    descriptor.name
                )))
            })
    }

    async fn invoke(&self, d: &IntentDescriptor, p: &Params) -> ActionResult {
        match d.intent {
            Intent::CreateClient => require(&self.clients, d)?.create(p).await,
            Intent::SearchClients => require(&self.clients, d)?.search(p).await,
            Intent::GetClient => require(&self.clients, d)?.get_by_id(p).await,
            Intent::UpdateClient => require(&self.clients, d)?.update(p).await,
            Intent::ChangeClientStatus => require(&self.clients, d)?.change_status(p).await,
            Intent::DeleteClient => require(&self.clients, d)?.delete(p).await,
            Intent::GetClientStats => require(&self.clients, d)?.stats(p).await,
            Intent::ExportClients => require(&self.clients, d)?.export(p).await,

            Intent::CreateProvider => require(&self.providers, d)?.create(p).await,
            Intent::SearchProviders => require(&self.providers, d)?.search(p).await,
            Intent::GetProvider => require(&self.providers, d)?.get_by_id(p).await,
            Intent::UpdateProvider => require(&self.providers, d)?.update(p).await,
            Intent::ChangeProviderStatus => require(&self.providers, d)?.change_status(p).await,
            Intent::DeleteProvider => require(&self.providers, d)?.delete(p).await,
            Intent::GetProviderStats => require(&self.providers, d)?.stats(p).await,
            Intent::ExportProviders => require(&self.providers, d)?.export(p).await,

            Intent::CreateMedia => require(&self.media, d)?.create_media(p).await,
            Intent::SearchMedia => require(&self.media, d)?.search_media(p).await,
            Intent::GetMedia => require(&self.media, d)?.get_media(p).await,
            Intent::UpdateMedia => require(&self.media, d)?.update_media(p).await,
            Intent::ChangeMediaStatus => require(&self.media, d)?.change_media_status(p).await,
            Intent::DeleteMedia => require(&self.media, d)?.delete_media(p).await,
            Intent::GetMediaStats => require(&self.media, d)?.media_stats(p).await,
            Intent::ExportMedia => require(&self.media, d)?.export_media(p).await,
            Intent::CreateTheme => require(&self.media, d)?.create_theme(p).await,
            Intent::SearchThemes => require(&self.media, d)?.search_themes(p).await,
            Intent::GetTheme => require(&self.media, d)?.get_theme(p).await,
            Intent::UpdateTheme => require(&self.media, d)?.update_theme(p).await,
            Intent::ChangeThemeStatus => require(&self.media, d)?.change_theme_status(p).await,
            Intent::DeleteTheme => require(&self.media, d)?.delete_theme(p).await,
            Intent::GetThemeStats => require(&self.media, d)?.theme_stats(p).await,
            Intent::ExportThemes => require(&self.media, d)?.export_themes(p).await,

            Intent::CreateCampaign => require(&self.campaigns, d)?.create(p).await,
            Intent::SearchCampaigns => require(&self.campaigns, d)?.search(p).await,
            Intent::GetCampaign => require(&self.campaigns, d)?.get_by_id(p).await,
            Intent::UpdateCampaign => require(&self.campaigns, d)?.update(p).await,
            Intent::ChangeCampaignStatus => require(&self.campaigns, d)?.change_status(p).await,
            Intent::DeleteCampaign => require(&self.campaigns, d)?.delete(p).await,
            Intent::GetCampaignStats => require(&self.campaigns, d)?.stats(p).await,
            Intent::ExportCampaigns => require(&self.campaigns, d)?.export(p).await,
            Intent::AddCampaignTheme => require(&self.campaigns, d)?.add_theme(p).await,
            Intent::RemoveCampaignTheme => require(&self.campaigns, d)?.remove_theme(p).await,
            Intent::GetCampaignThemes => require(&self.campaigns, d)?.themes(p).await,

            Intent::CreateOrder => require(&self.orders, d)?.create(p).await,
            Intent::SearchOrders => require(&self.orders, d)?.search(p).await,
            Intent::GetOrder => require(&self.orders, d)?.get_by_id(p).await,
            Intent::UpdateOrder => require(&self.orders, d)?.update(p).await,
            Intent::ChangeOrderStatus => require(&self.orders, d)?.change_status(p).await,
            Intent::ChangeOrderPriority => require(&self.orders, d)?.change_priority(p).await,
            Intent::DeleteOrder => require(&self.orders, d)?.delete(p).await,
            Intent::GetOrderStats => require(&self.orders, d)?.stats(p).await,
            Intent::ExportOrders => require(&self.orders, d)?.export(p).await,
            Intent::AddOrderDetail => require(&self.orders, d)?.add_detail(p).await,
            Intent::RemoveOrderDetail => require(&self.orders, d)?.remove_detail(p).await,
            Intent::GenerateOrderNumber => {
                require(&self.orders, d)?.generate_order_number(p).await
            }
        }
    }
}

use std::sync::Arc;

use tracing::info;

use crate::auth::{AuthOutcome, AuthProvider, TurnContext, USER_READ_SCOPE, UserCredential};
use crate::cards::{CardRenderer, CardTemplate};
use crate::config::{AppConfig, OnBehalfOfConfig};
use crate::dataset::StockDataset;
use crate::errors::{HandlerError, RenderError};
use crate::profile::ProfileClient;
use crate::query::{MessagingExtensionQuery, QUERY_INVOKE, StockQuery};
use crate::response::{QueryResponse, ResponseEnvelope, ResultAttachment};

/// Answers stock search queries for one signed-in user per turn.
///
/// Holds only read-only state, so one instance serves concurrent turns.
#[derive(Clone)]
pub struct QueryHandler {
    obo: OnBehalfOfConfig,
    login_endpoint: String,
    auth: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileClient>,
    renderer: Arc<dyn CardRenderer>,
    template: Arc<CardTemplate>,
    dataset: StockDataset,
}

impl QueryHandler {
    /// Builds a handler over the bundled card template and stock data.
    pub fn new(
        config: &AppConfig,
        auth: Arc<dyn AuthProvider>,
        profiles: Arc<dyn ProfileClient>,
        renderer: Arc<dyn CardRenderer>,
    ) -> Result<Self, HandlerError> {
        let template = CardTemplate::bundled()?;
        let dataset = StockDataset::bundled()?;
        Ok(Self::with_data(config, auth, profiles, renderer, template, dataset))
    }

    pub fn with_data(
        config: &AppConfig,
        auth: Arc<dyn AuthProvider>,
        profiles: Arc<dyn ProfileClient>,
        renderer: Arc<dyn CardRenderer>,
        template: CardTemplate,
        dataset: StockDataset,
    ) -> Self {
        Self {
            obo: config.on_behalf_of(),
            login_endpoint: config.initiate_login_endpoint(),
            auth,
            profiles,
            renderer,
            template: Arc::new(template),
            dataset,
        }
    }

    pub fn dataset(&self) -> &StockDataset {
        &self.dataset
    }

    pub async fn handle_query(
        &self,
        context: &TurnContext,
        query: &MessagingExtensionQuery,
    ) -> Result<QueryResponse, HandlerError> {
        if context.invoke_name != QUERY_INVOKE {
            return Err(HandlerError::UnsupportedInvoke(context.invoke_name.clone()));
        }

        let token = match self
            .auth
            .authenticate(context, &self.obo, &[USER_READ_SCOPE], &self.login_endpoint)
            .await
            .map_err(HandlerError::Auth)?
        {
            AuthOutcome::Authenticated(token) => token,
            AuthOutcome::ConsentRequired(response) => return Ok(QueryResponse::SignIn(response)),
        };

        let credential = UserCredential::new(&token, &self.obo);
        let profile = self
            .profiles
            .fetch_self(&credential)
            .await
            .map_err(HandlerError::Profile)?;
        let profile_json = serde_json::to_string(&profile)
            .unwrap_or_else(|err| format!("<unserializable: {err}>"));
        info!(
            user_id = context.user_id.as_deref().unwrap_or_default(),
            profile = %profile_json,
            "profile from directory lookup"
        );

        // Values are logged only; every record is returned regardless of them.
        let stock_query = StockQuery::from_parameters(&query.parameters)?;
        info!(
            stock_index = %stock_query.stock_index,
            number_of_stocks = %stock_query.number_of_stocks,
            price_to_book = %stock_query.price_to_book,
            price_to_earnings = %stock_query.price_to_earnings,
            "stock query parameters"
        );

        let attachments = self.render_all()?;
        Ok(QueryResponse::Results(ResponseEnvelope::results(attachments)))
    }

    fn render_all(&self) -> Result<Vec<ResultAttachment>, RenderError> {
        self.dataset
            .records()
            .iter()
            .map(|record| -> Result<ResultAttachment, RenderError> {
                let data = record.to_value()?;
                let card = self.renderer.render(&self.template, &data)?;
                let preview = self
                    .renderer
                    .render_preview(&record.company_name, &record.symbol);
                Ok(ResultAttachment { card, preview })
            })
            .collect()
    }
}

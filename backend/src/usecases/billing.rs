use std::sync::Arc;

use axum::http::StatusCode;
use copyforge_core::domain::{
    entities::customers::CustomerLinkEntity,
    repositories::{customers::CustomerLinkRepository, subscriptions::SubscriptionRecordRepository},
    value_objects::subscriptions::{
        BillingCustomer, BillingRedirectDto, CheckoutSessionModel, PortalSessionModel,
        SubscriptionRecordDto,
    },
};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use super::stripe_gateway::StripeGateway;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("an email address is required to create a billing customer")]
    MissingEmail,
    #[error("no price was requested and no default price is configured")]
    MissingPrice,
    #[error("payment provider request failed")]
    Upstream(anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BillingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BillingError::MissingEmail | BillingError::MissingPrice => StatusCode::BAD_REQUEST,
            BillingError::Upstream(_) => StatusCode::BAD_GATEWAY,
            BillingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, BillingError>;

/// Defaults applied when a request leaves them out.
#[derive(Debug, Clone)]
pub struct BillingDefaults {
    pub price_id: Option<String>,
    pub portal_return_url: String,
}

pub struct BillingUseCase<Cust, Sub, Stripe>
where
    Cust: CustomerLinkRepository + Send + Sync + 'static,
    Sub: SubscriptionRecordRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    customer_repo: Arc<Cust>,
    subscription_repo: Arc<Sub>,
    stripe_client: Arc<Stripe>,
    defaults: BillingDefaults,
}

impl<Cust, Sub, Stripe> BillingUseCase<Cust, Sub, Stripe>
where
    Cust: CustomerLinkRepository + Send + Sync + 'static,
    Sub: SubscriptionRecordRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    pub fn new(
        customer_repo: Arc<Cust>,
        subscription_repo: Arc<Sub>,
        stripe_client: Arc<Stripe>,
        defaults: BillingDefaults,
    ) -> Self {
        Self {
            customer_repo,
            subscription_repo,
            stripe_client,
            defaults,
        }
    }

    pub async fn create_portal_session(
        &self,
        customer: BillingCustomer,
        model: PortalSessionModel,
    ) -> UseCaseResult<BillingRedirectDto> {
        let user_id = customer.user_id;
        let stripe_customer_id = self.find_or_create_customer(&customer).await?;
        let return_url = model
            .return_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.defaults.portal_return_url.clone());

        let url = self
            .stripe_client
            .create_billing_portal_session(&stripe_customer_id, &return_url)
            .await
            .map_err(|err| {
                error!(%user_id, stripe_error = ?err, "billing: failed to create portal session");
                BillingError::Upstream(err)
            })?;

        info!(%user_id, "billing: portal session created");
        Ok(BillingRedirectDto { url })
    }

    pub async fn create_checkout_session(
        &self,
        customer: BillingCustomer,
        model: CheckoutSessionModel,
    ) -> UseCaseResult<BillingRedirectDto> {
        let user_id = customer.user_id;
        let price_id = model
            .price_id
            .filter(|price| !price.trim().is_empty())
            .or_else(|| self.defaults.price_id.clone())
            .ok_or(BillingError::MissingPrice)?;

        let stripe_customer_id = self.find_or_create_customer(&customer).await?;

        let url = self
            .stripe_client
            .create_checkout_session(&price_id, &stripe_customer_id, user_id)
            .await
            .map_err(|err| {
                error!(%user_id, %price_id, stripe_error = ?err, "billing: failed to create checkout session");
                BillingError::Upstream(err)
            })?;

        info!(%user_id, %price_id, "billing: checkout session created");
        Ok(BillingRedirectDto { url })
    }

    pub async fn list_subscriptions(&self, user_id: Uuid) -> UseCaseResult<Vec<SubscriptionRecordDto>> {
        let records = self
            .subscription_repo
            .list_by_user_id(&user_id.to_string())
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "billing: failed to list subscriptions");
                BillingError::Internal(err)
            })?;

        Ok(records.into_iter().map(SubscriptionRecordDto::from).collect())
    }

    async fn find_or_create_customer(&self, customer: &BillingCustomer) -> UseCaseResult<String> {
        let user_id = customer.user_id;

        let existing = self
            .customer_repo
            .find_stripe_customer_id(&user_id.to_string())
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "billing: failed to load customer link");
                BillingError::Internal(err)
            })?;
        if let Some(stripe_customer_id) = existing {
            return Ok(stripe_customer_id);
        }

        let email = customer
            .email
            .as_deref()
            .filter(|email| !email.trim().is_empty())
            .ok_or(BillingError::MissingEmail)?;

        let stripe_customer_id = self
            .stripe_client
            .create_customer(email, user_id)
            .await
            .map_err(|err| {
                error!(%user_id, stripe_error = ?err, "billing: failed to create customer");
                BillingError::Upstream(err)
            })?;

        self.customer_repo
            .upsert_customer_link(CustomerLinkEntity {
                user_id: user_id.to_string(),
                stripe_customer_id: stripe_customer_id.clone(),
            })
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "billing: failed to store customer link");
                BillingError::Internal(err)
            })?;

        info!(%user_id, %stripe_customer_id, "billing: customer created and linked");
        Ok(stripe_customer_id)
    }
}

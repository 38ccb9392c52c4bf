use diesel::prelude::*;

use crate::infra::db::postgres::schema::customers;

/// Link between an application user and their Stripe customer. The user id is
/// kept exactly as the application hands it to Stripe.
#[derive(Debug, Clone, PartialEq, Eq, Selectable, Queryable, Insertable)]
#[diesel(table_name = customers)]
pub struct CustomerLinkEntity {
    #[diesel(column_name = id)]
    pub user_id: String,
    pub stripe_customer_id: String,
}

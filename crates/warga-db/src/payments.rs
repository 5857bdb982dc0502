use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};

use warga_data::{Delete, Insert, Payment, PaymentFilter, Query, QueryError, Retrieve, Update};

use crate::{results::Id, Connection};

#[async_trait]
impl Query<Payment> for Connection {
    type Filter = PaymentFilter;

    // Filter payments
    async fn query(&self, filter: &Self::Filter) -> Result<Vec<Payment>> {
        let mut conn = self.lock().await;
        let mut qry = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                id,
                user_id,
                ROUND(amount, 10) AS amount,
                date,
                status,
                method,
                reference
            FROM payments
            WHERE 1
            "#,
        );
        if let Some(id) = filter.id {
            qry.push(" AND id = ").push_bind(id);
        }
        if let Some(user_id) = filter.user_id {
            qry.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(status) = filter.status {
            qry.push(" AND status = ").push_bind(status);
        }
        if let Some(date_before) = filter.date_before {
            qry.push(" AND date <= ").push_bind(date_before);
        }
        if let Some(date_after) = filter.date_after {
            qry.push(" AND date >= ").push_bind(date_after);
        }
        qry.push(" ORDER BY date, id");

        let payments: Vec<Payment> = qry.build_query_as().fetch_all(&mut *conn).await?;
        Ok(payments)
    }
}

#[async_trait]
impl Retrieve<Payment> for Connection {
    type Key = u32;

    /// Fetch a single payment by ID
    async fn retrieve(&self, id: Self::Key) -> Result<Payment> {
        let filter = PaymentFilter {
            id: Some(id),
            ..Default::default()
        };
        let payment = self
            .query(&filter)
            .await?
            .pop()
            .ok_or(QueryError::NotFound)?;
        Ok(payment)
    }
}

#[async_trait]
impl Insert<Payment> for Connection {
    async fn insert(&self, payment: Payment) -> Result<Payment> {
        let insert: Id<u32> = {
            let mut conn = self.lock().await;
            let mut qry = QueryBuilder::<Sqlite>::new(
                r#"INSERT INTO payments (
                    user_id,
                    amount,
                    date,
                    status,
                    method,
                    reference
                ) VALUES (
                "#,
            );
            qry.separated(", ")
                .push_bind(payment.user_id)
                .push_bind(payment.amount)
                .push_bind(payment.date)
                .push_bind(payment.status)
                .push_bind(&payment.method)
                .push_bind(&payment.reference);

            qry.push(") RETURNING id ")
                .build_query_as()
                .fetch_one(&mut *conn)
                .await?
        };
        self.retrieve(insert.id).await
    }
}

#[async_trait]
impl Update<Payment> for Connection {
    /// Update a payment
    async fn update(&self, payment: Payment) -> Result<Payment> {
        {
            let mut conn = self.lock().await;
            QueryBuilder::<Sqlite>::new("UPDATE payments SET")
                .push(" user_id = ")
                .push_bind(payment.user_id)
                .push(", amount = ")
                .push_bind(payment.amount)
                .push(", date = ")
                .push_bind(payment.date)
                .push(", status = ")
                .push_bind(payment.status)
                .push(", method = ")
                .push_bind(&payment.method)
                .push(", reference = ")
                .push_bind(&payment.reference)
                .push(" WHERE id = ")
                .push_bind(payment.id)
                .build()
                .execute(&mut *conn)
                .await?;
        }
        self.retrieve(payment.id).await
    }
}

#[async_trait]
impl Delete<Payment> for Connection {
    async fn delete(&self, payment: Payment) -> Result<()> {
        let mut conn = self.lock().await;
        QueryBuilder::<Sqlite>::new("DELETE FROM payments WHERE id = ")
            .push_bind(payment.id)
            .build()
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use warga_data::{Delete, Insert, Payment, PaymentFilter, Query, QueryError, Retrieve, Update};

use crate::store::Snapshot;
use crate::FileStore;

fn check_user_exists(snapshot: &Snapshot, payment: &Payment) -> Result<()> {
    if !snapshot.users.rows.iter().any(|u| u.id == payment.user_id) {
        return Err(anyhow!(
            "payment references unknown user {}",
            payment.user_id
        ));
    }
    Ok(())
}

#[async_trait]
impl Query<Payment> for FileStore {
    type Filter = PaymentFilter;

    async fn query(&self, filter: &Self::Filter) -> Result<Vec<Payment>> {
        let snapshot = self.read().await?;
        let mut payments: Vec<Payment> = snapshot
            .payments
            .rows
            .iter()
            .filter(|p| p.matches(filter))
            .cloned()
            .collect();
        payments.sort_by_key(|p| (p.date, p.id));
        Ok(payments)
    }
}

#[async_trait]
impl Retrieve<Payment> for FileStore {
    type Key = u32;

    async fn retrieve(&self, id: Self::Key) -> Result<Payment> {
        let snapshot = self.read().await?;
        let payment = snapshot
            .payments
            .rows
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(QueryError::NotFound)?;
        Ok(payment)
    }
}

#[async_trait]
impl Insert<Payment> for FileStore {
    async fn insert(&self, payment: Payment) -> Result<Payment> {
        self.write(move |snapshot| {
            check_user_exists(snapshot, &payment)?;
            let payment = Payment {
                id: snapshot.payments.allocate(),
                ..payment
            };
            snapshot.payments.rows.push(payment.clone());
            Ok(payment)
        })
        .await
    }
}

#[async_trait]
impl Update<Payment> for FileStore {
    async fn update(&self, payment: Payment) -> Result<Payment> {
        self.write(move |snapshot| {
            check_user_exists(snapshot, &payment)?;
            let row = snapshot
                .payments
                .rows
                .iter_mut()
                .find(|p| p.id == payment.id)
                .ok_or(QueryError::NotFound)?;
            *row = payment.clone();
            Ok(payment)
        })
        .await
    }
}

#[async_trait]
impl Delete<Payment> for FileStore {
    async fn delete(&self, payment: Payment) -> Result<()> {
        self.write(move |snapshot| {
            snapshot.payments.rows.retain(|p| p.id != payment.id);
            Ok(())
        })
        .await
    }
}

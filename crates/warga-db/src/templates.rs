use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};

use warga_data::{Delete, Insert, Query, QueryError, Retrieve, Template, TemplateFilter};

use crate::{
    results::{unique_violation, Id},
    Connection,
};

#[async_trait]
impl Query<Template> for Connection {
    type Filter = TemplateFilter;

    async fn query(&self, filter: &Self::Filter) -> Result<Vec<Template>> {
        let mut conn = self.lock().await;
        let mut qry = QueryBuilder::<Sqlite>::new("SELECT id, name, body FROM templates WHERE 1");
        if let Some(id) = filter.id {
            qry.push(" AND id = ").push_bind(id);
        }
        if let Some(name) = filter.name.clone() {
            qry.push(" AND name = ").push_bind(name);
        }
        qry.push(" ORDER BY id");
        let templates: Vec<Template> = qry.build_query_as().fetch_all(&mut *conn).await?;
        Ok(templates)
    }
}

#[async_trait]
impl Retrieve<Template> for Connection {
    type Key = u32;

    async fn retrieve(&self, id: Self::Key) -> Result<Template> {
        let template = self
            .query(&TemplateFilter {
                id: Some(id),
                ..Default::default()
            })
            .await?
            .pop()
            .ok_or(QueryError::NotFound)?;
        Ok(template)
    }
}

#[async_trait]
impl Insert<Template> for Connection {
    async fn insert(&self, template: Template) -> Result<Template> {
        let insert: Id<u32> = {
            let mut conn = self.lock().await;
            let mut qry = QueryBuilder::<Sqlite>::new("INSERT INTO templates (name, body) VALUES (");
            qry.separated(", ")
                .push_bind(&template.name)
                .push_bind(&template.body);
            qry.push(") RETURNING id ")
                .build_query_as()
                .fetch_one(&mut *conn)
                .await
                .map_err(|e| unique_violation(e, &template.name))?
        };
        self.retrieve(insert.id).await
    }
}

#[async_trait]
impl Delete<Template> for Connection {
    async fn delete(&self, template: Template) -> Result<()> {
        let mut conn = self.lock().await;
        QueryBuilder::<Sqlite>::new("DELETE FROM templates WHERE id = ")
            .push_bind(template.id)
            .build()
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

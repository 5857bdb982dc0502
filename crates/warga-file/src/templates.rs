use anyhow::Result;
use async_trait::async_trait;

use warga_data::{Delete, Insert, Query, QueryError, Retrieve, Template, TemplateFilter};

use crate::FileStore;

#[async_trait]
impl Query<Template> for FileStore {
    type Filter = TemplateFilter;

    async fn query(&self, filter: &Self::Filter) -> Result<Vec<Template>> {
        let snapshot = self.read().await?;
        Ok(snapshot
            .templates
            .rows
            .iter()
            .filter(|t| t.matches(filter))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Retrieve<Template> for FileStore {
    type Key = u32;

    async fn retrieve(&self, id: Self::Key) -> Result<Template> {
        let snapshot = self.read().await?;
        let template = snapshot
            .templates
            .rows
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(QueryError::NotFound)?;
        Ok(template)
    }
}

#[async_trait]
impl Insert<Template> for FileStore {
    async fn insert(&self, template: Template) -> Result<Template> {
        self.write(move |snapshot| {
            if snapshot
                .templates
                .rows
                .iter()
                .any(|t| t.name.eq_ignore_ascii_case(&template.name))
            {
                return Err(QueryError::Duplicate(template.name.clone()).into());
            }
            let template = Template {
                id: snapshot.templates.allocate(),
                ..template
            };
            snapshot.templates.rows.push(template.clone());
            Ok(template)
        })
        .await
    }
}

#[async_trait]
impl Delete<Template> for FileStore {
    async fn delete(&self, template: Template) -> Result<()> {
        self.write(move |snapshot| {
            snapshot.templates.rows.retain(|t| t.id != template.id);
            Ok(())
        })
        .await
    }
}

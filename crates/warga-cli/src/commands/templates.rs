use anyhow::Result;
use clap::{Args, Subcommand};
use inquire::Confirm;

use warga_data::{Delete, Insert, Query, Retrieve, Store, Template, TemplateFilter};

use crate::formatting::PrintFormatted;

#[derive(Subcommand, Debug)]
pub enum Templates {
    /// List message templates
    #[clap(name = "list")]
    List,
    /// Add a template. Placeholders: {name} {email} {house_number}
    /// {amount} {date} {status} {reference}
    #[clap(name = "add")]
    Add(AddTemplate),
    /// Delete a template
    #[clap(name = "delete")]
    Delete(DeleteTemplate),
}

impl Templates {
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        match self {
            Templates::List => {
                let templates: Vec<Template> = db.query(&TemplateFilter::default()).await?;
                templates.print_formatted();
                Ok(())
            }
            Templates::Add(cmd) => cmd.run(db).await,
            Templates::Delete(cmd) => cmd.run(db).await,
        }
    }
}

#[derive(Args, Debug)]
pub struct AddTemplate {
    #[clap(short, long)]
    pub name: String,
    #[clap(short, long)]
    pub body: String,
}

impl AddTemplate {
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        let template = db
            .insert(Template {
                name: self.name,
                body: self.body,
                ..Default::default()
            })
            .await?;
        println!("Template added with id {}.", template.id);
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct DeleteTemplate {
    #[clap(short, long)]
    pub id: u32,
}

impl DeleteTemplate {
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        let template: Template = db.retrieve(self.id).await?;
        template.print_formatted();
        let confirm = Confirm::new("Delete template?").with_default(true);
        if !confirm.prompt()? {
            return Ok(());
        }
        db.delete(template).await?;
        Ok(())
    }
}

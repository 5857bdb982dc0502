use async_trait::async_trait;

use warga_data::{Payment, Template, User};

use crate::{normalize_phone, render, MessageContext, NotifyError};

/// A rendered message ready to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub phone: String,
    pub body: String,
}

/// Something that delivers messages
#[async_trait]
pub trait Dispatcher {
    async fn send(&self, message: &Message) -> Result<(), NotifyError>;
}

/// Render a template for a user and an optional payment
pub fn compose(
    template: &Template,
    user: &User,
    payment: Option<&Payment>,
    country_code: &str,
) -> Result<Message, NotifyError> {
    let phone = normalize_phone(&user.phone, country_code)
        .ok_or_else(|| NotifyError::NoPhone(user.email.clone()))?;
    let context = MessageContext::new(user, payment);
    Ok(Message {
        phone,
        body: render(&template.body, &context),
    })
}

/// Outcome of a notification run
#[derive(Debug, Default)]
pub struct NotifyReport {
    pub sent: usize,
    pub failed: Vec<(u32, NotifyError)>,
}

/// Send a template to each recipient. Failures are collected per
/// user and do not stop the run.
pub async fn notify_all<D>(
    dispatcher: &D,
    template: &Template,
    recipients: &[(User, Option<Payment>)],
    country_code: &str,
) -> NotifyReport
where
    D: Dispatcher + Sync,
{
    let mut report = NotifyReport::default();
    for (user, payment) in recipients {
        let result = match compose(template, user, payment.as_ref(), country_code) {
            Ok(message) => dispatcher.send(&message).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => report.sent += 1,
            Err(err) => {
                tracing::warn!(user_id = user.id, "notification failed: {}", err);
                report.failed.push((user.id, err));
            }
        }
    }
    tracing::info!(
        template = %template.name,
        sent = report.sent,
        failed = report.failed.len(),
        "notification run finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Outbox {
        messages: Mutex<Vec<Message>>,
    }

    #[async_trait]
    impl Dispatcher for Outbox {
        async fn send(&self, message: &Message) -> Result<(), NotifyError> {
            if message.phone.ends_with("000") {
                return Err(NotifyError::Rejected(400, "blocked".to_string()));
            }
            self.messages.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn user(id: u32, name: &str, phone: &str) -> User {
        User {
            id,
            name: name.to_string(),
            email: format!("{}@warga.test", name.to_lowercase()),
            phone: phone.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_notify_all() {
        let template = Template {
            id: 1,
            name: "reminder".to_string(),
            body: "Hi {name}, please pay {amount}".to_string(),
        };
        let payment = Payment {
            amount: 50000.0,
            ..Default::default()
        };
        let recipients = vec![
            (user(1, "Siti", "0812-1111-2222"), Some(payment)),
            (user(2, "Budi", ""), None),
            (user(3, "Rina", "0812-0000-0000"), None),
        ];

        let outbox = Outbox::default();
        let report = notify_all(&outbox, &template, &recipients, "62").await;
        assert_eq!(report.sent, 1);
        assert_eq!(report.failed.len(), 2);
        assert!(matches!(report.failed[0], (2, NotifyError::NoPhone(_))));
        assert!(matches!(report.failed[1], (3, NotifyError::Rejected(400, _))));

        let messages = outbox.messages.lock().unwrap();
        assert_eq!(
            messages[0],
            Message {
                phone: "6281211112222".to_string(),
                body: "Hi Siti, please pay 50000".to_string(),
            }
        );
    }
}

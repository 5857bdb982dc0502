use warga_data::{Payment, User};

/// Values available to a message template
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MessageContext {
    pub name: String,
    pub email: String,
    pub house_number: String,
    pub amount: String,
    pub date: String,
    pub status: String,
    pub reference: String,
}

impl MessageContext {
    /// Payment placeholders render empty when there is no payment.
    pub fn new(user: &User, payment: Option<&Payment>) -> Self {
        let mut context = MessageContext {
            name: user.name.clone(),
            email: user.email.clone(),
            house_number: user.house_number.clone(),
            ..Default::default()
        };
        if let Some(payment) = payment {
            context.amount = format_amount(payment.amount);
            context.date = payment.date.format("%Y-%m-%d").to_string();
            context.status = payment.status.to_string();
            context.reference = payment.reference.clone();
        }
        context
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        let value = match key {
            "name" => &self.name,
            "email" => &self.email,
            "house_number" => &self.house_number,
            "amount" => &self.amount,
            "date" => &self.date,
            "status" => &self.status,
            "reference" => &self.reference,
            _ => return None,
        };
        Some(value)
    }
}

/// Whole amounts without decimals, anything else with two
fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{:.0}", amount)
    } else {
        format!("{:.2}", amount)
    }
}

/// Replace `{placeholder}`s in a template body. Unknown
/// placeholders and unbalanced braces are kept verbatim.
pub fn render(body: &str, context: &MessageContext) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find(['{', '}']) {
            Some(end) if after.as_bytes()[end] == b'}' => {
                let key = &after[..end];
                match context.lookup(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

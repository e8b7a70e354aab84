//! Input validation rules for both form steps.
//!
//! Error *display* is gated on a field having been touched (blurred at
//! least once); the enabled state of each step's action button always
//! reflects live validity regardless of touch state. Empty input is
//! treated as absence, never as malformed — validating it must not panic
//! and must not flag a visible error.

use std::collections::HashSet;

use regex::Regex;

use crate::phase::FlowPhase;

/// Consumer email providers rejected for the work-email field.
pub const FREE_EMAIL_PROVIDERS: [&str; 5] = [
    "gmail.com",
    "yahoo.com",
    "outlook.com",
    "aol.com",
    "hotmail.com",
];

/// A form field across both steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    WorkEmail,
    CompanyName,
    CompanyDomain,
    BusinessDescription,
    IcpDescription,
    ValueProposition,
}

impl FieldId {
    /// The step this field belongs to.
    pub fn phase(&self) -> FlowPhase {
        match self {
            Self::WorkEmail | Self::CompanyName | Self::CompanyDomain => FlowPhase::CompanyInput,
            Self::BusinessDescription | Self::IcpDescription | Self::ValueProposition => {
                FlowPhase::ContextEdit
            }
        }
    }

    /// All fields, step 1 first.
    pub fn all() -> [FieldId; 6] {
        [
            Self::WorkEmail,
            Self::CompanyName,
            Self::CompanyDomain,
            Self::BusinessDescription,
            Self::IcpDescription,
            Self::ValueProposition,
        ]
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::WorkEmail => "work_email",
            Self::CompanyName => "company_name",
            Self::CompanyDomain => "company_domain",
            Self::BusinessDescription => "business_description",
            Self::IcpDescription => "icp_description",
            Self::ValueProposition => "value_proposition",
        };
        write!(f, "{s}")
    }
}

/// Raw user input for all six fields.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    pub email: String,
    pub company_name: String,
    pub company_domain: String,
    pub business_description: String,
    pub icp_description: String,
    pub value_proposition: String,
}

impl FormFields {
    pub fn get(&self, field: FieldId) -> &str {
        match field {
            FieldId::WorkEmail => &self.email,
            FieldId::CompanyName => &self.company_name,
            FieldId::CompanyDomain => &self.company_domain,
            FieldId::BusinessDescription => &self.business_description,
            FieldId::IcpDescription => &self.icp_description,
            FieldId::ValueProposition => &self.value_proposition,
        }
    }

    pub fn set(&mut self, field: FieldId, value: impl Into<String>) {
        let slot = match field {
            FieldId::WorkEmail => &mut self.email,
            FieldId::CompanyName => &mut self.company_name,
            FieldId::CompanyDomain => &mut self.company_domain,
            FieldId::BusinessDescription => &mut self.business_description,
            FieldId::IcpDescription => &mut self.icp_description,
            FieldId::ValueProposition => &mut self.value_proposition,
        };
        *slot = value.into();
    }
}

/// Compiled validation rules.
pub struct InputRules {
    email: Regex,
    domain: Regex,
}

impl InputRules {
    pub fn new() -> Self {
        Self {
            email: Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap(),
            domain: Regex::new(
                r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*\.[a-zA-Z]{2,}$",
            )
            .unwrap(),
        }
    }

    /// Work-email check: well-formed and not from a free consumer provider.
    pub fn is_valid_work_email(&self, email: &str) -> bool {
        let email = email.trim();
        self.email.is_match(email) && !self.is_free_provider(email)
    }

    /// Whether the address's domain part is on the consumer-provider denylist.
    pub fn is_free_provider(&self, email: &str) -> bool {
        match email.split('@').nth(1) {
            Some(provider) => {
                let provider = provider.to_lowercase();
                FREE_EMAIL_PROVIDERS.iter().any(|p| *p == provider)
            }
            None => false,
        }
    }

    /// Domain check: accepts a bare domain or a full `http(s)://` URL.
    /// A leading `www.` is stripped before validation.
    pub fn is_valid_domain(&self, input: &str) -> bool {
        let input = input.trim();
        if input.is_empty() {
            return false;
        }

        // Full URL: validate the hostname part only.
        let host = input
            .strip_prefix("https://")
            .or_else(|| input.strip_prefix("http://"))
            .map(|rest| {
                rest.split(['/', '?', '#'])
                    .next()
                    .unwrap_or_default()
            })
            .unwrap_or(input);

        let host = host.strip_prefix("www.").unwrap_or(host);
        self.domain.is_match(host)
    }

    /// Whether `field` currently holds an *invalid* value that should flag
    /// an error once the field is touched. Empty fields in step 1 never
    /// flag (they only hold the button disabled); company name never flags
    /// at all. Step-2 fields flag when blank.
    pub fn field_error(&self, fields: &FormFields, field: FieldId) -> bool {
        let value = fields.get(field).trim();
        match field {
            FieldId::WorkEmail => !value.is_empty() && !self.is_valid_work_email(value),
            FieldId::CompanyName => false,
            FieldId::CompanyDomain => !value.is_empty() && !self.is_valid_domain(value),
            FieldId::BusinessDescription
            | FieldId::IcpDescription
            | FieldId::ValueProposition => value.is_empty(),
        }
    }

    /// Live validity of step 1 — gates the analyze button.
    pub fn step1_valid(&self, fields: &FormFields) -> bool {
        self.is_valid_work_email(&fields.email)
            && !fields.company_name.trim().is_empty()
            && self.is_valid_domain(&fields.company_domain)
    }

    /// Live validity of step 2 — gates the email-leads button.
    pub fn step2_valid(&self, fields: &FormFields) -> bool {
        !fields.business_description.trim().is_empty()
            && !fields.icp_description.trim().is_empty()
            && !fields.value_proposition.trim().is_empty()
    }

    /// Validity of the step owning `field`.
    pub fn step_valid(&self, fields: &FormFields, phase: FlowPhase) -> bool {
        match phase {
            FlowPhase::ContextEdit => self.step2_valid(fields),
            _ => self.step1_valid(fields),
        }
    }
}

impl Default for InputRules {
    fn default() -> Self {
        Self::new()
    }
}

/// Fields the user has focused and then blurred at least once.
#[derive(Debug, Default, Clone)]
pub struct TouchedFields(HashSet<FieldId>);

impl TouchedFields {
    pub fn touch(&mut self, field: FieldId) {
        self.0.insert(field);
    }

    pub fn contains(&self, field: FieldId) -> bool {
        self.0.contains(&field)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

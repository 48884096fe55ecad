//! Contact form handling.
//!
//! The form is a placeholder: a submission is decoded, acknowledged on the
//! page that answers it, and then dropped. Nothing is validated, stored or
//! sent anywhere.

use log::info;

/// Field values captured from one contact form submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConsultationRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ConsultationRequest {
    /// Decode an `application/x-www-form-urlencoded` body.
    ///
    /// Missing fields stay empty, unknown fields are ignored, and invalid
    /// UTF-8 is replaced rather than rejected. When a field repeats, the last
    /// value wins.
    pub fn from_form(body: &[u8]) -> Self {
        let mut request = ConsultationRequest::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "name" => request.name = value.into_owned(),
                "email" => request.email = value.into_owned(),
                "message" => request.message = value.into_owned(),
                _ => {}
            }
        }
        request
    }

    pub fn acknowledgment(&self) -> String {
        format!(
            "Thank you, {}! Your consultation request has been received and we will be in touch shortly.",
            self.name
        )
    }
}

/// Where the contact form is in its (single render) lifecycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FormState {
    #[default]
    Idle,
    Submitted(ConsultationRequest),
}

impl FormState {
    /// Accept a submission. Every request is accepted as-is.
    pub fn submit(request: ConsultationRequest) -> Self {
        info!(
            "Consultation request received from '{}' ({} byte message)",
            request.name,
            request.message.len()
        );
        FormState::Submitted(request)
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self, FormState::Submitted(_))
    }

    pub fn request(&self) -> Option<&ConsultationRequest> {
        match self {
            FormState::Idle => None,
            FormState::Submitted(request) => Some(request),
        }
    }

    pub fn acknowledgment(&self) -> Option<String> {
        self.request().map(ConsultationRequest::acknowledgment)
    }
}

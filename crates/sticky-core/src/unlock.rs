//! Private-view unlock gate.
//!
//! The gate starts locked on every launch and never persists its state. A
//! request for the private view either passes straight through (already
//! unlocked) or opens a PIN prompt: `Setup` when the user has no PIN yet,
//! `Entry` when they have one. Until the server has reported which, the
//! request is refused rather than guessed. The network round trip for a submitted PIN happens
//! outside the gate; its outcome is fed back through
//! [`PrivateGate::complete_setup`] or [`PrivateGate::complete_entry`].

use std::fmt;

use crate::error::ValidationError;

const PIN_LENGTH: usize = 4;

/// A PIN that passed client-side validation
#[derive(Clone, PartialEq, Eq)]
pub struct Pin(String);

impl Pin {
    /// Accept exactly four ASCII digits.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.len() == PIN_LENGTH && raw.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::InvalidPin)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin([REDACTED])")
    }
}

/// Which PIN form is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinPrompt {
    /// The user has never set a PIN
    Setup,
    /// The user must enter their existing PIN
    Entry,
}

/// Result of asking for the private view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivateRequest {
    Granted,
    Prompt(PinPrompt),
}

#[derive(Debug, Clone, Default)]
pub struct PrivateGate {
    unlocked: bool,
    has_pin: Option<bool>,
    prompt: Option<PinPrompt>,
}

impl PrivateGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// `None` until the server has reported the PIN status.
    pub const fn has_pin(&self) -> Option<bool> {
        self.has_pin
    }

    pub const fn prompt(&self) -> Option<PinPrompt> {
        self.prompt
    }

    /// Record whether the server says a PIN exists.
    pub fn set_has_pin(&mut self, has_pin: bool) {
        self.has_pin = Some(has_pin);
    }

    /// Ask for the private view. Fails while the PIN status is unknown.
    pub fn request_private(&mut self) -> Result<PrivateRequest, ValidationError> {
        if self.unlocked {
            return Ok(PrivateRequest::Granted);
        }

        let prompt = match self.has_pin {
            Some(true) => PinPrompt::Entry,
            Some(false) => PinPrompt::Setup,
            None => return Err(ValidationError::PinStatusUnknown),
        };
        self.prompt = Some(prompt);
        Ok(PrivateRequest::Prompt(prompt))
    }

    /// Check a submitted PIN against the open prompt.
    ///
    /// Both setup and entry PINs must be four digits.
    pub fn prepare_submit(&self, raw: &str) -> Result<(PinPrompt, Pin), ValidationError> {
        let prompt = self.prompt.ok_or(ValidationError::NoPinPrompt)?;
        Ok((prompt, Pin::parse(raw)?))
    }

    /// Apply the set-PIN outcome. Returns whether the gate is now unlocked.
    pub fn complete_setup(&mut self, accepted: bool) -> bool {
        if accepted && self.prompt == Some(PinPrompt::Setup) {
            self.has_pin = Some(true);
            self.unlock();
        }
        self.unlocked
    }

    /// Apply the verify-PIN outcome. A rejected PIN keeps the prompt open.
    pub fn complete_entry(&mut self, valid: bool) -> bool {
        if valid && self.prompt == Some(PinPrompt::Entry) {
            self.unlock();
        }
        self.unlocked
    }

    /// Close the prompt without changing the lock.
    pub fn cancel(&mut self) {
        self.prompt = None;
    }

    /// Re-lock, as on any switch away from the private view.
    pub fn lock(&mut self) {
        if self.unlocked {
            tracing::debug!("Private notes locked");
        }
        self.unlocked = false;
        self.prompt = None;
    }

    fn unlock(&mut self) {
        tracing::info!("Private notes unlocked");
        self.unlocked = true;
        self.prompt = None;
    }
}

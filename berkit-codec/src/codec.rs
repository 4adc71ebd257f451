//! BER codec bound to one schema
//!
//! A `BerCodec` pairs a schema root with resolved settings and a
//! summarizer. It is cheap to build and holds no per-call state, so the
//! registry creates a fresh one for every call.

use crate::adapter::{to_message, to_value};
use crate::message::Message;
use crate::properties::CodecProperties;
use crate::summary::{join, summarize_or, Summarizer};
use berkit_asn1::{ber, BerOptions, SchemaNode};
use berkit_core::BerResult;
use log::debug;
use std::sync::Arc;

pub struct BerCodec {
    schema: Arc<SchemaNode>,
    summarizer: Arc<dyn Summarizer>,
    options: BerOptions,
    prefix: Option<String>,
}

impl BerCodec {
    /// Create a codec, resolving `properties` into transcoder settings
    ///
    /// # Error Handling
    /// Returns `BerError::Config` for malformed recognised properties.
    pub fn new(
        schema: Arc<SchemaNode>,
        summarizer: Arc<dyn Summarizer>,
        properties: &CodecProperties,
    ) -> BerResult<Self> {
        let options = properties.ber_options()?;
        let prefix = properties.summary_prefix()?.map(str::to_string);
        Ok(Self {
            schema,
            summarizer,
            options,
            prefix,
        })
    }

    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    pub fn options(&self) -> &BerOptions {
        &self.options
    }

    /// Encode a message; returns the bytes and the summary line
    pub fn encode(&self, message: &Message) -> BerResult<(Vec<u8>, String)> {
        let value = to_value(&self.schema, message)?;
        let bytes = ber::encode_with(&self.schema, &value, self.options)?;
        debug!("encoded {} into {} bytes", self.schema.label(), bytes.len());
        Ok((bytes, self.summary(message)))
    }

    /// Decode a buffer holding exactly one message
    pub fn decode(&self, data: &[u8]) -> BerResult<(Message, String)> {
        let value = ber::decode_exact(&self.schema, data, self.options)?;
        let message = to_message(&value)?;
        let summary = self.summary(&message);
        Ok((message, summary))
    }

    /// Decode the message at the front of `data`
    ///
    /// # Returns
    /// The message, its summary and the number of bytes it occupied.
    pub fn decode_prefix(&self, data: &[u8]) -> BerResult<(Message, String, usize)> {
        let (value, consumed) = ber::decode_with(&self.schema, data, self.options)?;
        let message = to_message(&value)?;
        let summary = self.summary(&message);
        Ok((message, summary, consumed))
    }

    /// Summary line for `message`, with the configured prefix
    pub fn summary(&self, message: &Message) -> String {
        let label = summarize_or(self.summarizer.as_ref(), message, &self.schema.label());
        match &self.prefix {
            Some(prefix) => join(prefix, &label),
            None => label,
        }
    }
}

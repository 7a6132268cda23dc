// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! External rendering/delivery collaborator the Notifier hands grouped
//! reports off to. `LoggingReporter` is the default; `RssReporter` keeps an
//! in-memory feed per address; `SmtpReporter` is a stub — actual delivery
//! is out of scope.

use std::collections::VecDeque;
use std::io::Cursor;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::ReporterError;
use crate::notifier::{NotifyJobWindow, NotifyRecipient};

#[async_trait]
pub trait Reporter: Send + Sync {
	async fn report(&self, recipients: &[NotifyRecipient], jobs: &[NotifyJobWindow]) -> Result<(), ReporterError>;
}

/// Writes a structured event per report. Always available, and what the
/// Notifier actually exercises by default.
pub struct LoggingReporter;

#[async_trait]
impl Reporter for LoggingReporter {
	async fn report(&self, recipients: &[NotifyRecipient], jobs: &[NotifyJobWindow]) -> Result<(), ReporterError> {
		for recipient in recipients {
			tracing::info!(
				address = %recipient.address,
				method = %recipient.method,
				job_count = jobs.len(),
				"notification report"
			);
		}
		Ok(())
	}
}

/// Unimplemented delivery path: email rendering/SMTP delivery is out of
/// scope for this transformation.
pub struct SmtpReporter;

#[async_trait]
impl Reporter for SmtpReporter {
	async fn report(&self, _recipients: &[NotifyRecipient], _jobs: &[NotifyJobWindow]) -> Result<(), ReporterError> {
		Err(ReporterError::NotConfigured)
	}
}

struct RssEntry {
	address: String,
	title: String,
	description: String,
	published: DateTime<Utc>,
}

/// Keeps the last `capacity` reports per address in memory and renders
/// them as a minimal valid RSS 2.0 feed on request.
pub struct RssReporter {
	entries: Mutex<VecDeque<RssEntry>>,
	capacity: usize,
}

impl RssReporter {
	pub fn new(capacity: usize) -> Self {
		Self { entries: Mutex::new(VecDeque::new()), capacity }
	}

	pub async fn feed_for(&self, address: &str) -> String {
		use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
		use quick_xml::writer::Writer;

		let entries = self.entries.lock().await;
		let mut writer = Writer::new(Cursor::new(Vec::new()));

		let _ = writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)));

		let mut rss = BytesStart::new("rss");
		rss.push_attribute(("version", "2.0"));
		let _ = writer.write_event(Event::Start(rss));
		let _ = writer.write_event(Event::Start(BytesStart::new("channel")));

		let _ = write_text_element(&mut writer, "title", &format!("cadence notifications for {address}"));
		let _ = write_text_element(&mut writer, "description", "job alarm and status notifications");

		for entry in entries.iter().filter(|e| e.address == address) {
			let _ = writer.write_event(Event::Start(BytesStart::new("item")));
			let _ = write_text_element(&mut writer, "title", &entry.title);
			let _ = write_text_element(&mut writer, "description", &entry.description);
			let _ = write_text_element(&mut writer, "pubDate", &entry.published.to_rfc2822());
			let _ = writer.write_event(Event::End(BytesEnd::new("item")));
		}

		let _ = writer.write_event(Event::End(BytesEnd::new("channel")));
		let _ = writer.write_event(Event::End(BytesEnd::new("rss")));

		String::from_utf8(writer.into_inner().into_inner()).unwrap_or_default()
	}
}

fn write_text_element<W: std::io::Write>(
	writer: &mut quick_xml::writer::Writer<W>,
	name: &str,
	text: &str,
) -> quick_xml::Result<()> {
	use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

	writer.write_event(Event::Start(BytesStart::new(name)))?;
	writer.write_event(Event::Text(BytesText::new(text)))?;
	writer.write_event(Event::End(BytesEnd::new(name)))?;
	Ok(())
}

#[async_trait]
impl Reporter for RssReporter {
	async fn report(&self, recipients: &[NotifyRecipient], jobs: &[NotifyJobWindow]) -> Result<(), ReporterError> {
		let description = jobs
			.iter()
			.map(|j| format!("job {} [{} .. {}]", j.job_id, j.window_start.to_rfc3339(), j.window_end.to_rfc3339()))
			.collect::<Vec<_>>()
			.join("; ");
		let title = format!("{} job(s) reported", jobs.len());

		let mut entries = self.entries.lock().await;
		for recipient in recipients {
			entries.push_back(RssEntry {
				address: recipient.address.clone(),
				title: title.clone(),
				description: description.clone(),
				published: Utc::now(),
			});
			while entries.len() > self.capacity {
				entries.pop_front();
			}
		}
		Ok(())
	}
}

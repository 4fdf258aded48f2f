//! TwiML documents returned to the telephony provider

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

/// TwiML content type
pub const CONTENT_TYPE: &str = "text/xml";

#[derive(Debug, Error)]
#[error("TwiML rendering failed: {0}")]
pub struct TwimlError(String);

fn render_err<E: std::fmt::Display>(err: E) -> TwimlError {
    TwimlError(err.to_string())
}

fn document<F>(body: F) -> Result<String, TwimlError>
where
    F: FnOnce(&mut Writer<Vec<u8>>) -> Result<(), TwimlError>,
{
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(render_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("Response")))
        .map_err(render_err)?;
    body(&mut writer)?;
    writer
        .write_event(Event::End(BytesEnd::new("Response")))
        .map_err(render_err)?;
    String::from_utf8(writer.into_inner()).map_err(render_err)
}

/// Bridge the call audio to a media stream
pub fn connect_stream(url: &str) -> Result<String, TwimlError> {
    document(|w| {
        w.write_event(Event::Start(BytesStart::new("Connect")))
            .map_err(render_err)?;
        let mut stream = BytesStart::new("Stream");
        stream.push_attribute(("url", url));
        w.write_event(Event::Empty(stream)).map_err(render_err)?;
        w.write_event(Event::End(BytesEnd::new("Connect")))
            .map_err(render_err)?;
        Ok(())
    })
}

/// Speak a message, then end the call
pub fn say_and_hangup(message: &str) -> Result<String, TwimlError> {
    document(|w| {
        w.write_event(Event::Start(BytesStart::new("Say")))
            .map_err(render_err)?;
        w.write_event(Event::Text(BytesText::new(message)))
            .map_err(render_err)?;
        w.write_event(Event::End(BytesEnd::new("Say")))
            .map_err(render_err)?;
        w.write_event(Event::Empty(BytesStart::new("Hangup")))
            .map_err(render_err)?;
        Ok(())
    })
}

use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// Splits subprocess output into logical lines.
///
/// Transcoders redraw their status line with `\r`, so both `\r` and `\n`
/// end a line. Empty lines (such as the gap in `\r\n`) are dropped and
/// invalid UTF-8 is replaced.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusLineCodec;

impl StatusLineCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for StatusLineCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(pos) = src.iter().position(|b| *b == b'\r' || *b == b'\n') else {
                return Ok(None);
            };
            let line = src.split_to(pos + 1);
            let text = String::from_utf8_lossy(&line[..pos]);
            if !text.trim().is_empty() {
                return Ok(Some(text.into_owned()));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let rest = src.split();
        let text = String::from_utf8_lossy(&rest);
        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text.into_owned()))
        }
    }
}

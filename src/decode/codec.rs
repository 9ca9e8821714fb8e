use bytes::{Buf, BytesMut};
use encoding_rs::Encoding;
use std::io;
use tokio_util::codec::Decoder;

/// Re-encodes a byte stream in some legacy charset (e.g. windows-1254 CSV
/// exports) as UTF-8, dropping a leading BOM.
pub(crate) struct Utf8Transcoder {
    decoder: encoding_rs::Decoder,
    finished: bool,
}

impl Utf8Transcoder {
    pub(crate) fn new(charset: &'static Encoding) -> Self {
        Self {
            decoder: charset.new_decoder_with_bom_removal(),
            finished: false,
        }
    }

    fn transcode(&mut self, src: &mut BytesMut, last: bool) -> Option<BytesMut> {
        let capacity = self
            .decoder
            .max_utf8_buffer_length(src.len())
            .unwrap_or(src.len() * 3 + 16);
        let mut out = BytesMut::zeroed(capacity);
        let (_result, read, written, _replaced) = self.decoder.decode_to_utf8(src, &mut out, last);
        src.advance(read);
        out.truncate(written);
        (written > 0).then_some(out)
    }
}

impl Decoder for Utf8Transcoder {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        Ok(self.transcode(src, false))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // the decoder must see `last = true` exactly once
        if self.finished {
            src.clear();
            return Ok(None);
        }
        self.finished = true;
        let out = self.transcode(src, true);
        src.clear();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcodes_windows_1254() {
        // "Ürün" in windows-1254
        let mut src = BytesMut::from(&[0xDC, b'r', 0xFC, b'n'][..]);
        let mut codec = Utf8Transcoder::new(encoding_rs::WINDOWS_1254);
        let out = codec.decode_eof(&mut src).unwrap().unwrap();
        assert_eq!(std::str::from_utf8(&out).unwrap(), "Ürün");
        assert!(codec.decode_eof(&mut src).unwrap().is_none());
    }
}

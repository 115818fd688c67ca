use bytes::{BufMut, Bytes, BytesMut};

use crate::stream::encode::EncodedFrame;

/// Part boundary for the MJPEG stream.
pub const BOUNDARY: &str = "frame";

/// `Content-Type` header value of the streaming response.
pub const CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// Frame one encoded image as a multipart part:
/// boundary line, part headers, blank line, payload, CRLF.
pub fn frame_part(frame: &EncodedFrame) -> Bytes {
    let header = format!(
        "--{BOUNDARY}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
        frame.content_type,
        frame.bytes.len()
    );
    let mut part = BytesMut::with_capacity(header.len() + frame.bytes.len() + 2);
    part.put_slice(header.as_bytes());
    part.put_slice(&frame.bytes);
    part.put_slice(b"\r\n");
    part.freeze()
}

// Stream pipeline — per-frame compensation, encoding, and multipart framing.

pub mod encode;
pub mod multipart;
pub mod stream_loop;

//! TCP transport
//!
//! The wire format is deliberately bare: one connection carries exactly
//! one message, with no framing, headers, or length prefix. The sender
//! opens a connection, writes the text, and closes; the receiver reads
//! until EOF and treats the whole stream as the message.

mod receiver;
mod sender;

pub use receiver::MessageListener;
pub use sender::send_message;

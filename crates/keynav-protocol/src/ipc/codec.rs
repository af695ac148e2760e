use std::io;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

/// Largest accepted frame; the biggest payload is the serialised config.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Errors from framing, encoding or decoding IPC messages.
#[derive(Debug, Error)]
pub enum Error {
    /// The JSON payload could not be produced or parsed.
    #[error("invalid message: {0}")]
    Json(#[from] serde_json::Error),
    /// Transport failure, including oversized frames.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Serialise `msg` into a frame payload.
pub fn encode<T: Serialize>(msg: &T) -> Result<Bytes, Error> {
    Ok(Bytes::from(serde_json::to_vec(msg)?))
}

/// Parse a frame payload.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, Error> {
    Ok(serde_json::from_slice(payload)?)
}

/// Wrap `io` in a big-endian u32 length-prefixed framer.
pub fn framed<S: AsyncRead + AsyncWrite>(io: S) -> Framed<S, LengthDelimitedCodec> {
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_LEN)
        .new_codec();
    Framed::new(io, codec)
}

/// Encode and send one message.
pub async fn send<S, T>(framed: &mut Framed<S, LengthDelimitedCodec>, msg: &T) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
    T: Serialize,
{
    framed.send(encode(msg)?).await?;
    Ok(())
}

/// Receive and decode one message. `Ok(None)` means the peer closed cleanly.
pub async fn recv<S, T>(framed: &mut Framed<S, LengthDelimitedCodec>) -> Result<Option<T>, Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
    T: DeserializeOwned,
{
    match framed.next().await {
        Some(frame) => Ok(Some(decode(&frame?)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncWriteExt, duplex};

    use super::*;
    use crate::{Command, Response};

    #[tokio::test]
    async fn request_and_reply_over_duplex() {
        let (a, b) = duplex(4096);
        let mut client = framed(a);
        let mut server = framed(b);

        send(&mut client, &Command::new("ping", Vec::<String>::new()))
            .await
            .unwrap();
        let cmd: Command = recv(&mut server).await.unwrap().unwrap();
        assert_eq!(cmd.action, "ping");

        send(&mut server, &Response::ok("pong")).await.unwrap();
        let resp: Response = recv(&mut client).await.unwrap().unwrap();
        assert!(resp.success);
        assert_eq!(resp.message, "pong");

        drop(server);
        assert!(recv::<_, Response>(&mut client).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn garbage_payload_is_a_json_error() {
        let (mut a, b) = duplex(64);
        let mut server = framed(b);
        a.write_all(&[0, 0, 0, 3, b'{', b'x', b'}']).await.unwrap();
        match recv::<_, Command>(&mut server).await {
            Err(Error::Json(_)) => {}
            other => panic!("{:?}", other),
        }
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let (mut a, b) = duplex(64);
        let mut server = framed(b);
        let len = (MAX_FRAME_LEN as u32 + 1).to_be_bytes();
        a.write_all(&len).await.unwrap();
        match recv::<_, Command>(&mut server).await {
            Err(Error::Io(_)) => {}
            other => panic!("{:?}", other),
        }
    }
}

use bytes::BytesMut;
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

/// The largest message which can be sent over UDP without EDNS.
pub const UDP_MESSAGE_MAX_LEN: usize = 512;

/// Read a DNS message from a TCP stream.
///
/// A DNS TCP message is slightly different to a DNS UDP message: it
/// has a big-endian u16 prefix giving the total length of the
/// message.  This is redundant (since the header is fixed-size and
/// says how many fields there are, and the fields contain length
/// information), but it means the entire message can be read before
/// parsing begins.
pub async fn read_tcp_bytes(stream: &mut TcpStream) -> Result<BytesMut, TcpError> {
    let expected = usize::from(
        stream
            .read_u16()
            .await
            .map_err(|error| TcpError::IO { id: None, error })?,
    );

    let mut bytes = BytesMut::with_capacity(expected);
    while bytes.len() < expected {
        match stream.read_buf(&mut bytes).await {
            Ok(0) => {
                return Err(TcpError::TooShort {
                    id: id_of(&bytes),
                    expected,
                    actual: bytes.len(),
                })
            }
            Err(error) => {
                return Err(TcpError::IO {
                    id: id_of(&bytes),
                    error,
                })
            }
            Ok(_) => (),
        }
    }
    bytes.truncate(expected);

    Ok(bytes)
}

fn id_of(bytes: &[u8]) -> Option<u16> {
    if bytes.len() >= 2 {
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    } else {
        None
    }
}

/// An error that can occur when reading a DNS TCP message.
#[derive(Debug)]
pub enum TcpError {
    TooShort {
        id: Option<u16>,
        expected: usize,
        actual: usize,
    },
    IO {
        id: Option<u16>,
        error: io::Error,
    },
}

/// Write a serialised message to a connected UDP socket.
///
/// # Errors
///
/// If the message is longer than `UDP_MESSAGE_MAX_LEN`, or sending
/// fails.
pub async fn send_udp_bytes(sock: &UdpSocket, bytes: &[u8]) -> Result<(), io::Error> {
    if bytes.len() > UDP_MESSAGE_MAX_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("message of {} octets is too long for UDP", bytes.len()),
        ));
    }

    sock.send(bytes).await?;
    Ok(())
}

/// Write a serialised message to a TCP channel.  This sends a
/// two-byte length prefix (big-endian u16).
///
/// # Errors
///
/// If the message is longer than a u16 can describe, or writing fails.
pub async fn send_tcp_bytes(stream: &mut TcpStream, bytes: &[u8]) -> Result<(), io::Error> {
    let Ok(len) = u16::try_from(bytes.len()) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("message of {} octets is too long for TCP", bytes.len()),
        ));
    };

    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(bytes).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    async fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let address = listener.local_addr().unwrap();
        let (client, server) = tokio::join!(TcpStream::connect(address), listener.accept());
        (client.unwrap(), server.unwrap().0)
    }

    #[tokio::test]
    async fn tcp_length_prefix_round_trip() {
        let (mut client, mut server) = connected_pair().await;

        send_tcp_bytes(&mut client, &[0xab, 0xcd, 1, 2, 3]).await.unwrap();
        let bytes = read_tcp_bytes(&mut server).await.unwrap();

        assert_eq!(&[0xab, 0xcd, 1, 2, 3], bytes.as_ref());
    }

    #[tokio::test]
    async fn tcp_too_short() {
        let (mut client, mut server) = connected_pair().await;

        client.write_all(&[0, 10, 0xab, 0xcd, 1]).await.unwrap();
        drop(client);

        match read_tcp_bytes(&mut server).await {
            Err(TcpError::TooShort {
                id,
                expected,
                actual,
            }) => {
                assert_eq!(Some(0xabcd), id);
                assert_eq!(10, expected);
                assert_eq!(3, actual);
            }
            other => panic!("expected TooShort, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn udp_rejects_long_message() {
        let sock = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        sock.connect(sock.local_addr().unwrap()).await.unwrap();

        let error = send_udp_bytes(&sock, &[0; UDP_MESSAGE_MAX_LEN + 1])
            .await
            .unwrap_err();
        assert_eq!(io::ErrorKind::InvalidInput, error.kind());
    }
}

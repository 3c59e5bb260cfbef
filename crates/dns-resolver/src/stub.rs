//! A stub resolver in the manner of resolver(3): send the question to
//! each configured recursive nameserver in turn, and return the first
//! answer.

use bytes::Bytes;
use std::future::Future;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;
use tracing::Instrument;

use dns_types::protocol::deserialise::ConsumableBuffer;
use dns_types::protocol::types::*;

use crate::conf::ResolvConf;
use crate::net::{read_tcp_bytes, send_tcp_bytes, send_udp_bytes, TcpError, UDP_MESSAGE_MAX_LEN};
use crate::{Backend, QueryError, RawAnswer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubResolver {
    nameservers: Vec<SocketAddr>,
    timeout: Duration,
    attempts: usize,
}

impl StubResolver {
    pub fn new(nameservers: Vec<SocketAddr>, timeout: Duration, attempts: usize) -> Self {
        Self {
            nameservers,
            timeout,
            attempts: attempts.max(1),
        }
    }

    pub fn from_conf(conf: &ResolvConf) -> Self {
        Self::new(conf.nameservers.clone(), conf.timeout, conf.attempts)
    }

    pub fn nameservers(&self) -> &[SocketAddr] {
        &self.nameservers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Backend for StubResolver {
    async fn raw_query(
        &self,
        name: &DomainName,
        qtype: RecordType,
        qclass: RecordClass,
    ) -> Result<RawAnswer, QueryError> {
        if self.nameservers.is_empty() {
            return Err(QueryError::NoNameservers);
        }

        let request = Message::make_query(rand::random(), name.clone(), qtype, qclass, true);
        let serialised = request.to_octets()?;

        let mut last_error = QueryError::NoNameservers;
        for _ in 0..self.attempts {
            for nameserver in &self.nameservers {
                match query_nameserver(*nameserver, &request, &serialised, self.timeout).await {
                    Ok(octets) => {
                        return Ok(RawAnswer {
                            nameserver: *nameserver,
                            octets,
                        })
                    }
                    Err(error) => {
                        tracing::debug!(%error, "nameserver did not answer");
                        last_error = error;
                    }
                }
            }
        }

        Err(last_error)
    }
}

/// Ask one nameserver over UDP, and if the response is truncated ask
/// again over TCP.  The response is checked to match the request.
async fn query_nameserver(
    address: SocketAddr,
    request: &Message,
    serialised_request: &[u8],
    duration: Duration,
) -> Result<Bytes, QueryError> {
    let octets = with_timeout(
        address,
        duration,
        query_nameserver_udp(address, serialised_request),
    )
    .instrument(tracing::error_span!("query_nameserver", %address, protocol = "udp"))
    .await?;

    if !check_response(address, request, &octets)?.is_truncated {
        return Ok(octets);
    }

    async {
        tracing::debug!("response truncated, retrying");
        let octets = with_timeout(
            address,
            duration,
            query_nameserver_tcp(address, serialised_request),
        )
        .await?;
        check_response(address, request, &octets)?;
        Ok(octets)
    }
    .instrument(tracing::error_span!("query_nameserver", %address, protocol = "tcp"))
    .await
}

async fn with_timeout<T>(
    address: SocketAddr,
    duration: Duration,
    future: impl Future<Output = Result<T, QueryError>>,
) -> Result<T, QueryError> {
    if let Ok(res) = timeout(duration, future).await {
        res
    } else {
        tracing::debug!(?duration, "timed out");
        Err(QueryError::Timeout {
            nameserver: address,
        })
    }
}

/// Timeout-less UDP exchange.
async fn query_nameserver_udp(
    address: SocketAddr,
    serialised_request: &[u8],
) -> Result<Bytes, QueryError> {
    if serialised_request.len() > UDP_MESSAGE_MAX_LEN {
        return Err(QueryError::QueryTooLong {
            len: serialised_request.len(),
        });
    }

    let io_error = |error| QueryError::Io {
        nameserver: address,
        error,
    };

    let local: SocketAddr = if address.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let sock = UdpSocket::bind(local).await.map_err(io_error)?;
    sock.connect(address).await.map_err(io_error)?;
    send_udp_bytes(&sock, serialised_request)
        .await
        .map_err(io_error)?;

    let mut buf = vec![0u8; UDP_MESSAGE_MAX_LEN];
    let size = sock.recv(&mut buf).await.map_err(io_error)?;
    buf.truncate(size);

    Ok(Bytes::from(buf))
}

/// Timeout-less TCP exchange.
async fn query_nameserver_tcp(
    address: SocketAddr,
    serialised_request: &[u8],
) -> Result<Bytes, QueryError> {
    let io_error = |error| QueryError::Io {
        nameserver: address,
        error,
    };

    let mut stream = TcpStream::connect(address).await.map_err(io_error)?;
    send_tcp_bytes(&mut stream, serialised_request)
        .await
        .map_err(io_error)?;

    match read_tcp_bytes(&mut stream).await {
        Ok(bytes) => Ok(bytes.freeze()),
        Err(TcpError::TooShort {
            expected, actual, ..
        }) => Err(QueryError::ShortResponse {
            nameserver: address,
            expected,
            actual,
        }),
        Err(TcpError::IO { error, .. }) => Err(io_error(error)),
    }
}

/// Parse just enough of a response to check it answers `request`,
/// returning its header.
fn check_response(
    address: SocketAddr,
    request: &Message,
    octets: &[u8],
) -> Result<Header, QueryError> {
    if let Some(header) = response_matches_request(request, octets) {
        Ok(header)
    } else {
        tracing::debug!("response does not match request");
        Err(QueryError::Mismatch {
            nameserver: address,
        })
    }
}

/// Very basic validation that a nameserver response matches a
/// message:
///
/// - Check the ID, opcode, and questions match the question (names
///   compared case-insensitively).
///
/// - Check it is a response.
///
/// The RCODE is not checked: a negative answer is still an answer.
/// Records after the question section are not looked at.
pub fn response_matches_request(request: &Message, octets: &[u8]) -> Option<Header> {
    let mut buffer = ConsumableBuffer::new(octets);
    let header = Header::deserialise(&mut buffer).ok()?;

    if request.header.id != header.id {
        return None;
    }
    if !header.is_response {
        return None;
    }
    if request.header.opcode != header.opcode {
        return None;
    }
    if usize::from(header.qdcount) != request.questions.len() {
        return None;
    }

    for expected in &request.questions {
        let question = Question::deserialise(&mut buffer).ok()?;
        if !question.name.eq_ignore_ascii_case(&expected.name)
            || question.qtype != expected.qtype
            || question.qclass != expected.qclass
        {
            return None;
        }
    }

    Some(header)
}

#[cfg(test)]
mod tests {
    use dns_types::protocol::types::test_util::*;
    use tokio::net::TcpListener;

    use super::*;

    fn request() -> Message {
        Message::make_query(
            1234,
            domain("www.example.com."),
            RecordType::A,
            RecordClass::IN,
            true,
        )
    }

    fn response_to(request: &Message, answers: Vec<ResourceRecord>) -> Message {
        let mut response = response(request.questions.clone(), answers);
        response.header.id = request.header.id;
        response
    }

    fn octets(message: &Message) -> Vec<u8> {
        message.to_octets().unwrap().to_vec()
    }

    #[test]
    fn response_matches_request_accepts() {
        let request = request();
        let response = response_to(
            &request,
            vec![a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1))],
        );

        assert_eq!(
            Some(response.header),
            response_matches_request(&request, &octets(&response))
        );
    }

    #[test]
    fn response_matches_request_checks_id() {
        let request = request();
        let mut response = response_to(&request, Vec::new());
        response.header.id += 1;

        assert_eq!(None, response_matches_request(&request, &octets(&response)));
    }

    #[test]
    fn response_matches_request_checks_qr() {
        let request = request();
        let mut response = response_to(&request, Vec::new());
        response.header.is_response = false;

        assert_eq!(None, response_matches_request(&request, &octets(&response)));
    }

    #[test]
    fn response_matches_request_checks_opcode() {
        let request = request();
        let mut response = response_to(&request, Vec::new());
        response.header.opcode = Opcode::Status;

        assert_eq!(None, response_matches_request(&request, &octets(&response)));
    }

    #[test]
    fn response_matches_request_checks_question() {
        let request = request();
        let mut response = response_to(&request, Vec::new());
        response.questions[0].qtype = RecordType::AAAA;

        assert_eq!(None, response_matches_request(&request, &octets(&response)));

        response.questions.clear();
        assert_eq!(None, response_matches_request(&request, &octets(&response)));
    }

    #[test]
    fn response_matches_request_ignores_name_case() {
        let request = request();
        let mut response = response_to(&request, Vec::new());
        response.questions[0].name = domain("WWW.Example.COM.");

        assert!(response_matches_request(&request, &octets(&response)).is_some());
    }

    #[test]
    fn response_matches_request_does_not_check_rcode() {
        let request = request();
        let mut response = response_to(&request, Vec::new());
        response.header.rcode = Rcode::NameError;

        assert!(response_matches_request(&request, &octets(&response)).is_some());
    }

    #[test]
    fn response_matches_request_rejects_garbage() {
        assert_eq!(None, response_matches_request(&request(), &[0x04, 0xd2, 0x80]));
    }

    async fn udp_nameserver() -> (UdpSocket, SocketAddr) {
        let sock = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let address = sock.local_addr().unwrap();
        (sock, address)
    }

    /// Answer one UDP query with `answers`, with the ID changed by
    /// `id_offset`.
    async fn answer_once(
        sock: UdpSocket,
        answers: Vec<ResourceRecord>,
        id_offset: u16,
        truncated: bool,
    ) {
        let mut buf = vec![0u8; UDP_MESSAGE_MAX_LEN];
        let (size, peer) = sock.recv_from(&mut buf).await.unwrap();
        let request = Message::from_octets(&buf[..size]).unwrap();

        let mut response = response_to(&request, answers);
        response.header.id = response.header.id.wrapping_add(id_offset);
        response.header.is_truncated = truncated;
        sock.send_to(&octets(&response), peer).await.unwrap();
    }

    #[tokio::test]
    async fn raw_query_over_udp() {
        let answers = vec![a_record("www.example.com.", Ipv4Addr::new(192, 0, 2, 1))];
        let (sock, address) = udp_nameserver().await;
        let server = tokio::spawn(answer_once(sock, answers.clone(), 0, false));

        let resolver = StubResolver::new(vec![address], Duration::from_secs(5), 1);
        let raw = resolver
            .raw_query(&domain("www.example.com."), RecordType::A, RecordClass::IN)
            .await
            .unwrap();
        server.await.unwrap();

        assert_eq!(address, raw.nameserver);
        assert_eq!(answers, raw.parse().unwrap().answers);
    }

    #[tokio::test]
    async fn raw_query_rejects_mismatched_id() {
        let (sock, address) = udp_nameserver().await;
        let server = tokio::spawn(answer_once(sock, Vec::new(), 1, false));

        let resolver = StubResolver::new(vec![address], Duration::from_secs(5), 1);
        let error = resolver
            .raw_query(&domain("www.example.com."), RecordType::A, RecordClass::IN)
            .await
            .unwrap_err();
        server.await.unwrap();

        assert!(matches!(error, QueryError::Mismatch { nameserver } if nameserver == address));
    }

    #[tokio::test]
    async fn raw_query_times_out() {
        let (_sock, address) = udp_nameserver().await;

        let resolver = StubResolver::new(vec![address], Duration::from_millis(50), 1);
        let error = resolver
            .raw_query(&domain("www.example.com."), RecordType::A, RecordClass::IN)
            .await
            .unwrap_err();

        assert!(matches!(error, QueryError::Timeout { .. }));
    }

    #[tokio::test]
    async fn raw_query_retries_truncated_over_tcp() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let address = listener.local_addr().unwrap();
        let sock = UdpSocket::bind(address).await.unwrap();

        let answers = vec![a_record("www.example.com.", Ipv4Addr::new(192, 0, 2, 2))];
        let udp_server = tokio::spawn(answer_once(sock, Vec::new(), 0, true));
        let tcp_answers = answers.clone();
        let tcp_server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let bytes = read_tcp_bytes(&mut stream).await.unwrap();
            let request = Message::from_octets(&bytes).unwrap();
            let response = response_to(&request, tcp_answers);
            send_tcp_bytes(&mut stream, &octets(&response)).await.unwrap();
        });

        let resolver = StubResolver::new(vec![address], Duration::from_secs(5), 1);
        let raw = resolver
            .raw_query(&domain("www.example.com."), RecordType::A, RecordClass::IN)
            .await
            .unwrap();
        udp_server.await.unwrap();
        tcp_server.await.unwrap();

        let message = raw.parse().unwrap();
        assert!(!message.header.is_truncated);
        assert_eq!(answers, message.answers);
    }

    #[tokio::test]
    async fn raw_query_without_nameservers() {
        let resolver = StubResolver::new(Vec::new(), Duration::from_secs(5), 1);
        let error = resolver
            .raw_query(&domain("www.example.com."), RecordType::A, RecordClass::IN)
            .await
            .unwrap_err();

        assert!(matches!(error, QueryError::NoNameservers));
    }

    #[test]
    fn from_conf() {
        let conf = ResolvConf::parse("nameserver 192.0.2.1\noptions timeout:2 attempts:0\n");
        let resolver = StubResolver::from_conf(&conf);

        assert_eq!(
            &[SocketAddr::new(Ipv4Addr::new(192, 0, 2, 1).into(), 53)],
            resolver.nameservers()
        );
        assert_eq!(Duration::from_secs(2), resolver.timeout());
        assert_eq!(1, resolver.attempts);
    }
}

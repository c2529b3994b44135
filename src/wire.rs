//! The boundary between logical segments and IPv4 datagrams. The engine core
//! never calls into this module; whoever owns the connection uses it to
//! decode what the network delivered and to encode what `segments_out`
//! produces.

use std::net::Ipv4Addr;

use bytes::Bytes;
use thiserror::Error;

use crate::segment::Segment;

const TCP_PROTO: u8 = 0x06;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("datagram does not carry TCP")]
    NotTcp,
    #[error("malformed header: {0:?}")]
    Malformed(etherparse::ReadError),
    #[error("segment too large for an IPv4 datagram")]
    Oversize,
}

/// Strip the IPv4 and TCP headers off a datagram and hand back the segment.
/// The datagram's own checksums are not verified here.
pub fn parse(datagram: &[u8]) -> Result<Segment, WireError> {
    let iph = etherparse::Ipv4HeaderSlice::from_slice(datagram).map_err(WireError::Malformed)?;
    if iph.protocol() != TCP_PROTO {
        return Err(WireError::NotTcp);
    }
    let rest = &datagram[iph.slice().len()..];
    let tcph = etherparse::TcpHeaderSlice::from_slice(rest).map_err(WireError::Malformed)?;
    let payload = Bytes::copy_from_slice(&rest[tcph.slice().len()..]);
    Ok(Segment {
        header: tcph.to_header(),
        payload,
    })
}

/// Wrap a segment in an IPv4 datagram from `src` to `dst`, TCP checksum
/// computed over the pseudo-header.
pub fn encode(seg: &Segment, src: Ipv4Addr, dst: Ipv4Addr) -> Result<Vec<u8>, WireError> {
    let mut ip = etherparse::Ipv4Header::new(
        0,
        64,
        etherparse::IpTrafficClass::Tcp,
        src.octets(),
        dst.octets(),
    );
    let mut tcp = seg.header.clone();
    ip.set_payload_len(tcp.header_len() as usize + seg.payload.len())
        .map_err(|_| WireError::Oversize)?;
    tcp.checksum = tcp
        .calc_checksum_ipv4(&ip, &seg.payload)
        .map_err(|_| WireError::Oversize)?;

    let mut out =
        Vec::with_capacity(ip.header_len() as usize + tcp.header_len() as usize + seg.payload.len());
    ip.write(&mut out).map_err(|_| WireError::Oversize)?;
    tcp.write(&mut out).map_err(|_| WireError::Oversize)?;
    out.extend_from_slice(&seg.payload);
    Ok(out)
}

//! General parsing utilities.

use nom::IResult;

use crate::protocol::serialize::Serializer;
use crate::Address;

/// Parse a statically-sized array with a parser.
pub fn parse_array<I, P, A, const LEN: usize>(
    parser: P,
) -> impl FnMut(I) -> IResult<I, [A; LEN]>
where
    I: Clone + PartialEq,
    P: Fn(I) -> IResult<I, A>,
    A: Default + Copy,
{
    move |input| {
        let mut data = [A::default(); LEN];
        let (input, _) = nom::multi::fill(&parser, &mut data[..])(input)?;
        Ok((input, data))
    }
}

/// Parse a two-letter AT command name.
pub fn parse_command(input: &[u8]) -> IResult<&[u8], [u8; 2]> {
    parse_array(nom::number::complete::u8)(input)
}

/// Parse a 64-bit address, big-endian.
pub fn parse_address(input: &[u8]) -> IResult<&[u8], Address> {
    let (input, addr) = nom::number::complete::be_u64(input)?;
    Ok((input, Address::new(addr)))
}

/// Take whatever is left as an owned payload.
pub fn parse_rest(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let (input, rest) = nom::combinator::rest(input)?;
    Ok((input, rest.to_vec()))
}

/// Fail unless the frame type is the one expected.
pub fn expect_type(input: &[u8], typ: u8, expected: u8) -> IResult<&[u8], ()> {
    if typ != expected {
        nom::combinator::fail(input)
    } else {
        Ok((input, ()))
    }
}

pub fn serialize_address<S>(ser: &mut S, addr: Address) -> Result<(), S::Error>
where
    S: Serializer,
{
    ser.write_be_u64(addr.as_u64())
}

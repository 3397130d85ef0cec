use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1},
    character::complete::{char, digit1, space1},
    combinator::{all_consuming, map, map_res, opt, recognize, rest, verify},
    sequence::{pair, preceded, tuple},
    IResult,
};

use navsync::protocol::{CheckpointChanged, ContinueReplay, Request, StartReplay};
use navsync::FrameId;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Cmd {
    Add(String),
    Fragile(String),
    Push,
    Pop,
    Request(Request),
    Show,
    Quit,
}

fn frame(input: &str) -> IResult<&str, FrameId> {
    map_res(preceded(opt(char('f')), digit1), |n: &str| {
        n.parse().map(FrameId)
    })(input)
}

fn index(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), |n: &str| n.parse())(input)
}

fn id(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace())(input)
}

fn title(input: &str) -> IResult<&str, String> {
    map(
        verify(preceded(space1, rest), |s: &str| !s.trim().is_empty()),
        |s: &str| s.trim().to_string(),
    )(input)
}

fn changed(input: &str) -> IResult<&str, Request> {
    map(
        tuple((tag("changed"), space1, id, space1, frame)),
        |(_, _, requested, _, source)| {
            Request::CheckpointChanged(CheckpointChanged {
                requested: requested.to_string(),
                source,
            })
        },
    )(input)
}

fn replay(input: &str) -> IResult<&str, Request> {
    map(
        tuple((tag("replay"), space1, index, space1, frame)),
        |(_, _, from_index, _, source)| Request::StartReplay(StartReplay { from_index, source }),
    )(input)
}

fn next(input: &str) -> IResult<&str, Request> {
    map(preceded(pair(tag("next"), space1), frame), |source| {
        Request::ContinueReplay(ContinueReplay { source })
    })(input)
}

fn cmd(input: &str) -> IResult<&str, Cmd> {
    use Cmd::*;
    alt((
        map(preceded(tag("add"), title), Add),
        map(preceded(tag("fragile"), title), Fragile),
        map(tag("push"), |_| Push),
        map(tag("pop"), |_| Pop),
        map(alt((changed, replay, next)), Request),
        map(tag("show"), |_| Show),
        map(tag("quit"), |_| Quit),
    ))(input)
}

pub(crate) fn parse(input: &str) -> IResult<&str, Cmd> {
    all_consuming(cmd)(input.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_edits() {
        assert_eq!(parse("add open  report ").unwrap().1, Cmd::Add("open  report".into()));
        assert_eq!(parse("fragile x").unwrap().1, Cmd::Fragile("x".into()));
        assert_eq!(parse("  push").unwrap().1, Cmd::Push);
        assert_eq!(parse("pop").unwrap().1, Cmd::Pop);
        assert!(parse("add   ").is_err());
    }

    #[test]
    fn test_parse_requests() {
        assert_eq!(
            parse("changed h3 f2").unwrap().1,
            Cmd::Request(Request::CheckpointChanged(CheckpointChanged {
                requested: "h3".into(),
                source: FrameId(2),
            }))
        );
        assert_eq!(
            parse("replay -1 4").unwrap().1,
            Cmd::Request(Request::StartReplay(StartReplay {
                from_index: -1,
                source: FrameId(4),
            }))
        );
        assert_eq!(
            parse("next f4").unwrap().1,
            Cmd::Request(Request::ContinueReplay(ContinueReplay {
                source: FrameId(4)
            }))
        );
        assert!(parse("next").is_err());
        assert!(parse("changed h3").is_err());
        assert!(parse("pushed").is_err());
    }
}

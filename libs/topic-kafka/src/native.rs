use topic_api::Offset;

/// Abstract offset to the `rdkafka` representation.
pub fn offset_to_native(offset: Offset) -> rdkafka::Offset {
    match offset {
        Offset::Beginning => rdkafka::Offset::Beginning,
        Offset::End => rdkafka::Offset::End,
        Offset::Stored => rdkafka::Offset::Stored,
        Offset::Unset => rdkafka::Offset::Invalid,
        Offset::Offset(n) => rdkafka::Offset::Offset(n),
    }
}

/// `rdkafka` offset to the abstract representation. Tail-relative offsets
/// have no abstract counterpart and map to `End`.
pub fn offset_from_native(offset: rdkafka::Offset) -> Offset {
    match offset {
        rdkafka::Offset::Beginning => Offset::Beginning,
        rdkafka::Offset::End | rdkafka::Offset::OffsetTail(_) => Offset::End,
        rdkafka::Offset::Stored => Offset::Stored,
        rdkafka::Offset::Invalid => Offset::Unset,
        rdkafka::Offset::Offset(n) if n >= 0 => Offset::Offset(n),
        rdkafka::Offset::Offset(_) => Offset::Unset,
    }
}

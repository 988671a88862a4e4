use crate::body::Body;
use crate::part::MimePart;

/// A read-only classification of a part as directly renderable content.
/// Produced by [`classify`], consumed by rendering; holds no state of
/// its own beyond references into the part tree.
#[derive(Debug)]
pub enum Viewable<'a> {
    /// A `text/plain` leaf
    Text(&'a MimePart),
    /// A `text/plain` leaf declaring `format=flowed`
    Flowed { part: &'a MimePart, del_sp: bool },
    /// A `text/html` leaf
    Html(&'a MimePart),
    /// An embedded `message/rfc822`: the container part plus the
    /// embedded message, shown as an inline header block. The embedded
    /// message's own body is not recursed into here.
    MessageHeader {
        container: &'a MimePart,
        message: &'a MimePart,
    },
    /// A `multipart/alternative` container: parallel candidate lists
    /// that let the renderer pick plain-vs-HTML at display time.
    Alternative {
        text: Vec<Viewable<'a>>,
        html: Vec<Viewable<'a>>,
    },
}

/// The outcome of walking a part tree: renderable views in document
/// order, plus the parts that did not classify as renderable.
#[derive(Debug, Default)]
pub struct Classified<'a> {
    pub viewables: Vec<Viewable<'a>>,
    pub attachments: Vec<&'a MimePart>,
}

/// Walk `part` and classify every leaf/subtree. Classification is
/// per-part best effort: an unrecognized part lands in `attachments`
/// rather than failing the walk, so a malformed part degrades to an
/// attachment instead of blanking the whole message.
pub fn classify(part: &MimePart) -> Classified<'_> {
    let mut result = Classified::default();
    classify_into(part, &mut result);
    result
}

fn classify_into<'a>(part: &'a MimePart, out: &mut Classified<'a>) {
    let mime_type = part.mime_type();

    if crate::is_same_mime_type(mime_type.as_deref(), Some("text/plain")) {
        out.viewables.push(classify_text_plain(part));
    } else if crate::is_same_mime_type(mime_type.as_deref(), Some("text/html")) {
        out.viewables.push(Viewable::Html(part));
    } else if crate::is_same_mime_type(mime_type.as_deref(), Some("message/rfc822")) {
        match part.body() {
            Body::Message(message) => {
                out.viewables.push(Viewable::MessageHeader {
                    container: part,
                    message,
                });
            }
            // An rfc822 part whose body was never parsed into a
            // message is opaque to the renderer
            _ => out.attachments.push(part),
        }
    } else if crate::is_same_mime_type(mime_type.as_deref(), Some("multipart/alternative")) {
        let alternative = classify_alternative(part, out);
        out.viewables.push(alternative);
    } else if mime_type.as_deref().is_some_and(crate::is_multipart) {
        for child in part.children() {
            classify_into(child, out);
        }
    } else {
        out.attachments.push(part);
    }
}

fn classify_text_plain(part: &MimePart) -> Viewable<'_> {
    let flowed = part
        .content_type_parameter("format")
        .is_some_and(|f| f.eq_ignore_ascii_case("flowed"));
    if flowed {
        let del_sp = part
            .content_type_parameter("delsp")
            .is_some_and(|d| d.eq_ignore_ascii_case("yes"));
        Viewable::Flowed { part, del_sp }
    } else {
        Viewable::Text(part)
    }
}

/// Bucket an alternative container's children into parallel text/html
/// candidate lists rather than flattening them. Non-renderable children
/// and embedded messages escape to the enclosing classification.
fn classify_alternative<'a>(part: &'a MimePart, out: &mut Classified<'a>) -> Viewable<'a> {
    let mut text = vec![];
    let mut html = vec![];
    for child in part.children() {
        let mut child_result = Classified::default();
        classify_into(child, &mut child_result);
        out.attachments.extend(child_result.attachments);
        for viewable in child_result.viewables {
            match viewable {
                Viewable::Text(_) | Viewable::Flowed { .. } => text.push(viewable),
                Viewable::Html(_) => html.push(viewable),
                Viewable::Alternative {
                    text: nested_text,
                    html: nested_html,
                } => {
                    text.extend(nested_text);
                    html.extend(nested_html);
                }
                message @ Viewable::MessageHeader { .. } => out.viewables.push(message),
            }
        }
    }
    Viewable::Alternative { text, html }
}

#[cfg(test)]
mod test {
    use super::*;

    fn alternative_with(children: Vec<MimePart>) -> MimePart {
        let mut part = MimePart::new_multipart("multipart/alternative");
        for child in children {
            part.attach(child);
        }
        part
    }

    fn flowed_part(del_sp: bool) -> MimePart {
        let mut part = MimePart::new_text_plain("flowed text");
        let delsp = if del_sp { "; delsp=yes" } else { "" };
        part.headers_mut()
            .set_header(
                "Content-Type",
                format!("text/plain; format=flowed{delsp}"),
            )
            .unwrap();
        part
    }

    #[test]
    fn plain_and_html_leaves() {
        let plain = MimePart::new_text_plain("hi");
        let result = classify(&plain);
        assert!(matches!(result.viewables.as_slice(), [Viewable::Text(_)]));
        assert!(result.attachments.is_empty());

        let html = MimePart::new_html("<p>hi</p>");
        let result = classify(&html);
        assert!(matches!(result.viewables.as_slice(), [Viewable::Html(_)]));
    }

    #[test]
    fn flowed_classification_carries_delsp() {
        let with_delsp = flowed_part(true);
        let result = classify(&with_delsp);
        assert!(matches!(
            result.viewables.as_slice(),
            [Viewable::Flowed { del_sp: true, .. }]
        ));

        let without_delsp = flowed_part(false);
        let result = classify(&without_delsp);
        assert!(matches!(
            result.viewables.as_slice(),
            [Viewable::Flowed { del_sp: false, .. }]
        ));
    }

    #[test]
    fn alternative_buckets_candidates() {
        let part = alternative_with(vec![
            MimePart::new_text_plain("plain version"),
            MimePart::new_html("<p>html version</p>"),
        ]);
        let result = classify(&part);
        match result.viewables.as_slice() {
            [Viewable::Alternative { text, html }] => {
                assert_eq!(text.len(), 1);
                assert_eq!(html.len(), 1);
                assert!(matches!(text[0], Viewable::Text(_)));
                assert!(matches!(html[0], Viewable::Html(_)));
            }
            other => panic!("expected a single Alternative, got {other:?}"),
        }
        assert!(result.attachments.is_empty());
    }

    #[test]
    fn embedded_message_becomes_header_view() {
        let inner = MimePart::new_text_plain("original");
        let wrapper = MimePart::new_message(inner);
        let result = classify(&wrapper);
        assert!(matches!(
            result.viewables.as_slice(),
            [Viewable::MessageHeader { .. }]
        ));
    }

    #[test]
    fn mixed_recurses_in_order_and_collects_attachments() {
        let mut mixed = MimePart::new_multipart("multipart/mixed");
        mixed.attach(MimePart::new_text_plain("body"));
        mixed.attach(MimePart::new_binary(
            "application/pdf",
            b"%PDF-1.4 pretend",
        ));
        mixed.attach(MimePart::new_html("<i>sig</i>"));

        let result = classify(&mixed);
        assert!(matches!(
            result.viewables.as_slice(),
            [Viewable::Text(_), Viewable::Html(_)]
        ));
        assert_eq!(result.attachments.len(), 1);
        assert_eq!(
            result.attachments[0].mime_type().as_deref(),
            Some("application/pdf")
        );
    }

    #[test]
    fn unrecognized_multipart_subtype_recurses() {
        let mut related = MimePart::new_multipart("multipart/related");
        related.attach(MimePart::new_html("<img src=cid:x>"));
        related.attach(MimePart::new_binary("image/png", &[0x89, b'P', b'N', b'G']));

        let result = classify(&related);
        assert!(matches!(result.viewables.as_slice(), [Viewable::Html(_)]));
        assert_eq!(result.attachments.len(), 1);
    }

    #[test]
    fn untyped_leaf_is_an_attachment() {
        let part = MimePart::new(
            crate::HeaderMap::default(),
            crate::Body::Raw(crate::RawBody::new("7bit", b"??".to_vec())),
        );
        let result = classify(&part);
        assert!(result.viewables.is_empty());
        assert_eq!(result.attachments.len(), 1);
    }
}

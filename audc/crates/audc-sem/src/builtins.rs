//! Static signature tables for built-in functions and domain members.
//!
//! The type checker resolves free calls against [`builtin_sig`] and member
//! access against [`member_sig`]; the interpreter dispatches on the same
//! names, so this module is the single source of truth for the built-in
//! surface.

use audc_par::{FuncSig, TypeSig};

/// Signature of a built-in free function, if the name is one.
pub fn builtin_sig(name: &str) -> Option<FuncSig> {
    let sig = match name {
        "print" => FuncSig {
            params: vec![TypeSig::String],
            ret: TypeSig::Void,
        },
        "input" => FuncSig {
            params: vec![],
            ret: TypeSig::String,
        },
        "btos" => FuncSig {
            params: vec![TypeSig::Bool],
            ret: TypeSig::String,
        },
        "stoi" => FuncSig {
            params: vec![TypeSig::String],
            ret: TypeSig::Int,
        },
        "itos" => FuncSig {
            params: vec![TypeSig::Int],
            ret: TypeSig::String,
        },
        "stof" => FuncSig {
            params: vec![TypeSig::String],
            ret: TypeSig::Float,
        },
        "ftos" => FuncSig {
            params: vec![TypeSig::Float],
            ret: TypeSig::String,
        },
        "itof" => FuncSig {
            params: vec![TypeSig::Int],
            ret: TypeSig::Float,
        },
        "ftoi" => FuncSig {
            params: vec![TypeSig::Float],
            ret: TypeSig::Int,
        },
        "atof" => FuncSig {
            params: vec![TypeSig::Audio],
            ret: TypeSig::File,
        },
        "ftoa" => FuncSig {
            params: vec![TypeSig::File],
            ret: TypeSig::Audio,
        },
        _ => return None,
    };
    Some(sig)
}

/// A resolved member: a read-only attribute or a method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Member {
    Attr(TypeSig),
    Method(FuncSig),
}

/// Resolves `target.name` against the static member tables.
///
/// `Audio` carries every `File` member plus its own metadata and editing
/// methods; `List<T>` members substitute the element type.
pub fn member_sig(target: &TypeSig, name: &str) -> Option<Member> {
    match target {
        TypeSig::File => file_member(name),
        TypeSig::Audio => audio_member(name),
        TypeSig::Folder => folder_member(name),
        TypeSig::List(elem) => list_member(elem, name),
        _ => None,
    }
}

fn file_member(name: &str) -> Option<Member> {
    let member = match name {
        "filename" => Member::Attr(TypeSig::String),
        "parent" => Member::Attr(TypeSig::Folder),
        "move" => Member::Method(FuncSig {
            params: vec![TypeSig::Folder],
            ret: TypeSig::Void,
        }),
        "delete" => Member::Method(FuncSig {
            params: vec![],
            ret: TypeSig::Void,
        }),
        _ => return None,
    };
    Some(member)
}

fn audio_member(name: &str) -> Option<Member> {
    if let Some(member) = file_member(name) {
        return Some(member);
    }
    let member = match name {
        "length" => Member::Attr(TypeSig::Int),
        "bitrate" => Member::Attr(TypeSig::Int),
        "title" => Member::Attr(TypeSig::String),
        "cut" => Member::Method(FuncSig {
            params: vec![TypeSig::Int, TypeSig::Int],
            ret: TypeSig::Void,
        }),
        "concat" => Member::Method(FuncSig {
            params: vec![TypeSig::Audio],
            ret: TypeSig::Void,
        }),
        "change_title" => Member::Method(FuncSig {
            params: vec![TypeSig::String],
            ret: TypeSig::Void,
        }),
        "change_format" => Member::Method(FuncSig {
            params: vec![TypeSig::String],
            ret: TypeSig::Void,
        }),
        "change_volume" => Member::Method(FuncSig {
            params: vec![TypeSig::Float],
            ret: TypeSig::Void,
        }),
        _ => return None,
    };
    Some(member)
}

fn folder_member(name: &str) -> Option<Member> {
    let member = match name {
        "files" => Member::Attr(TypeSig::List(Box::new(TypeSig::File))),
        "subfolders" => Member::Attr(TypeSig::List(Box::new(TypeSig::Folder))),
        "is_root" => Member::Attr(TypeSig::Bool),
        _ => return None,
    };
    Some(member)
}

fn list_member(elem: &TypeSig, name: &str) -> Option<Member> {
    let member = match name {
        "len" => Member::Method(FuncSig {
            params: vec![],
            ret: TypeSig::Int,
        }),
        "get" => Member::Method(FuncSig {
            params: vec![TypeSig::Int],
            ret: elem.clone(),
        }),
        "set" => Member::Method(FuncSig {
            params: vec![TypeSig::Int, elem.clone()],
            ret: TypeSig::Void,
        }),
        _ => return None,
    };
    Some(member)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_signatures() {
        assert_eq!(builtin_sig("print").unwrap().ret, TypeSig::Void);
        assert_eq!(builtin_sig("input").unwrap().params.len(), 0);
        assert_eq!(builtin_sig("ftoa").unwrap().ret, TypeSig::Audio);
        assert!(builtin_sig("nope").is_none());
    }

    #[test]
    fn test_audio_inherits_file_members() {
        assert_eq!(
            member_sig(&TypeSig::Audio, "filename"),
            Some(Member::Attr(TypeSig::String))
        );
        assert!(matches!(
            member_sig(&TypeSig::Audio, "move"),
            Some(Member::Method(_))
        ));
        assert_eq!(
            member_sig(&TypeSig::Audio, "length"),
            Some(Member::Attr(TypeSig::Int))
        );
        // Plain files have no audio metadata.
        assert!(member_sig(&TypeSig::File, "length").is_none());
    }

    #[test]
    fn test_list_members_substitute_element_type() {
        let list = TypeSig::List(Box::new(TypeSig::File));
        match member_sig(&list, "get") {
            Some(Member::Method(sig)) => assert_eq!(sig.ret, TypeSig::File),
            other => panic!("expected method, got {other:?}"),
        }
        match member_sig(&list, "set") {
            Some(Member::Method(sig)) => assert_eq!(sig.params[1], TypeSig::File),
            other => panic!("expected method, got {other:?}"),
        }
    }

    #[test]
    fn test_simple_types_have_no_members() {
        assert!(member_sig(&TypeSig::Int, "len").is_none());
        assert!(member_sig(&TypeSig::String, "filename").is_none());
    }
}

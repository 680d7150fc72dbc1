//! Who is allowed to talk to the bot.
//!
//! Two durable facts drive the decision: the allow-list of contacts and the
//! owner conversation binding. The owner's own messages are accepted only
//! from the bound conversation; everybody else must be on the allow-list.

use serde::{Deserialize, Serialize};

/// Origin of an inbound message, as far as access control is concerned.
#[derive(Clone, Copy, Debug)]
pub struct Sender<'a> {
    /// The message was sent by the owner.
    pub from_self: bool,
    pub id: &'a str,
    pub conversation: &'a str,
}

/// Decision taken for an inbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// First owner message ever: bind its conversation and stop there.
    BindOwner,
    Pass,
    /// Owner message from a conversation other than the bound one.
    ForeignConversation,
    /// Sender is not on the allow-list.
    NotAllowed,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerBinding {
    #[serde(rename = "chatId")]
    pub conversation: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowList {
    contacts: Vec<String>,
}

impl AllowList {
    pub fn new(contacts: Vec<String>) -> Self {
        Self { contacts }
    }

    /// Adds `contact`. Returns `false` if it is empty or already allowed.
    pub fn allow(&mut self, contact: &str) -> bool {
        if contact.is_empty() || self.contains(contact) {
            return false;
        }
        self.contacts.push(contact.to_string());
        true
    }

    /// Removes `contact`. Returns `false` if it was not allowed.
    pub fn remove(&mut self, contact: &str) -> bool {
        match self.contacts.iter().position(|c| c == contact) {
            Some(index) => {
                self.contacts.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, contact: &str) -> bool {
        self.contacts.iter().any(|c| c == contact)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.contacts.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

/// Decides whether a message reaches the command parser.
pub fn admit(
    sender: Sender<'_>,
    allow_list: &AllowList,
    binding: Option<&OwnerBinding>,
) -> Admission {
    if sender.from_self {
        return match binding {
            None => Admission::BindOwner,
            Some(bound) if bound.conversation != sender.conversation => {
                Admission::ForeignConversation
            }
            Some(_) => Admission::Pass,
        };
    }

    if allow_list.contains(sender.id) {
        Admission::Pass
    } else {
        Admission::NotAllowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(conversation: &str) -> Sender<'_> {
        Sender {
            from_self: true,
            id: "owner",
            conversation,
        }
    }

    fn contact(id: &str) -> Sender<'_> {
        Sender {
            from_self: false,
            id,
            conversation: id,
        }
    }

    #[test]
    fn first_owner_message_binds() {
        let list = AllowList::default();
        assert_eq!(admit(owner("chat-1"), &list, None), Admission::BindOwner);
    }

    #[test]
    fn owner_is_gated_by_bound_conversation() {
        let list = AllowList::default();
        let binding = OwnerBinding {
            conversation: "chat-1".to_string(),
        };
        assert_eq!(admit(owner("chat-1"), &list, Some(&binding)), Admission::Pass);
        assert_eq!(
            admit(owner("chat-2"), &list, Some(&binding)),
            Admission::ForeignConversation
        );
    }

    #[test]
    fn contacts_need_allow_list_even_without_binding() {
        let mut list = AllowList::default();
        assert_eq!(admit(contact("5511"), &list, None), Admission::NotAllowed);

        assert!(list.allow("5511"));
        assert_eq!(admit(contact("5511"), &list, None), Admission::Pass);
        assert_eq!(admit(contact("5522"), &list, None), Admission::NotAllowed);
    }

    #[test]
    fn allow_and_remove() {
        let mut list = AllowList::default();
        assert!(list.allow("5511"));
        assert!(!list.allow("5511"));
        assert!(!list.allow(""));
        assert_eq!(list.len(), 1);

        assert!(!list.remove("5522"));
        assert!(list.remove("5511"));
        assert!(list.is_empty());
    }
}

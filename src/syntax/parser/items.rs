use crate::diagnostics::error_codes::UNSUPPORTED_SYNTAX;
use crate::syntax::Identifier;
use crate::syntax::document::{
    BindingDecl, CallbackDecl, ComponentDecl, ElementDecl, ExportList, GlobalDecl, HandlerDecl,
    ImportDecl, Item, Member, NameAlias, PropertyDecl, RepeaterDecl, StructDecl, TypeExpr,
    Visibility,
};
use crate::syntax::precedence::Precedence;
use crate::syntax::token_type::TokenType;

use super::Parser;

impl Parser {
    pub(super) fn parse_item(&mut self) -> Option<Item> {
        match self.current_token.token_type {
            TokenType::Import => self.parse_import().map(Item::Import),
            TokenType::Export => self.parse_export(),
            TokenType::Component => self.parse_component(false).map(Item::Component),
            TokenType::Struct => self.parse_struct(false).map(Item::Struct),
            TokenType::Global => self.parse_global(false).map(Item::Global),
            TokenType::Semicolon => None,
            _ => {
                self.current_error("`import`, `export`, `component`, `struct` or `global`");
                None
            }
        }
    }

    /// `import { A, B as C } from "file.vel";`
    fn parse_import(&mut self) -> Option<ImportDecl> {
        let start = self.current_token.position;
        if !self.expect_peek(TokenType::LBrace) {
            return None;
        }
        let names = self.parse_name_alias_list()?;
        if !self.expect_peek(TokenType::From) || !self.expect_peek(TokenType::String) {
            return None;
        }
        let path = self.current_token.literal.clone();
        if !self.expect_peek(TokenType::Semicolon) {
            return None;
        }
        Some(ImportDecl {
            names,
            path,
            span: self.span_from(start),
        })
    }

    fn parse_export(&mut self) -> Option<Item> {
        let start = self.current_token.position;
        self.next_token();
        match self.current_token.token_type {
            TokenType::Component => self.parse_component(true).map(Item::Component),
            TokenType::Struct => self.parse_struct(true).map(Item::Struct),
            TokenType::Global => self.parse_global(true).map(Item::Global),
            TokenType::LBrace => {
                let names = self.parse_name_alias_list()?;
                if self.is_peek_token(TokenType::Semicolon) {
                    self.next_token();
                }
                Some(Item::Export(ExportList {
                    names,
                    span: self.span_from(start),
                }))
            }
            _ => {
                self.current_error("`component`, `struct`, `global` or `{`");
                None
            }
        }
    }

    /// Entered on `{`, returns on `}`.
    fn parse_name_alias_list(&mut self) -> Option<Vec<NameAlias>> {
        let mut names = Vec::new();
        while !self.is_peek_token(TokenType::RBrace) {
            let name = self.expect_peek_name()?;
            let alias = if self.is_peek_token(TokenType::As) {
                self.next_token();
                Some(self.expect_peek_name()?)
            } else {
                None
            };
            names.push(NameAlias { name, alias });
            if !self.is_peek_token(TokenType::Comma) {
                break;
            }
            self.next_token();
        }
        if !self.expect_peek(TokenType::RBrace) {
            return None;
        }
        Some(names)
    }

    /// `struct Name { field: type, ... }`
    fn parse_struct(&mut self, exported: bool) -> Option<StructDecl> {
        let start = self.current_token.position;
        let name = self.expect_peek_name()?;
        if !self.expect_peek(TokenType::LBrace) {
            return None;
        }
        let fields = self.parse_field_types()?;
        Some(StructDecl {
            exported,
            name,
            fields,
            span: self.span_from(start),
        })
    }

    /// Entered on `{`, returns on `}`. Shared by struct declarations and
    /// anonymous struct types.
    fn parse_field_types(&mut self) -> Option<Vec<(Identifier, TypeExpr)>> {
        let mut fields = Vec::new();
        while !self.is_peek_token(TokenType::RBrace) {
            let field = self.expect_peek_name()?;
            if !self.expect_peek(TokenType::Colon) {
                return None;
            }
            self.next_token();
            let ty = self.parse_type()?;
            fields.push((field, ty));
            if !self.is_peek_token(TokenType::Comma) {
                break;
            }
            self.next_token();
        }
        if !self.expect_peek(TokenType::RBrace) {
            return None;
        }
        Some(fields)
    }

    /// `global Name { members }`
    fn parse_global(&mut self, exported: bool) -> Option<GlobalDecl> {
        let start = self.current_token.position;
        let name = self.expect_peek_name()?;
        if !self.expect_peek(TokenType::LBrace) {
            return None;
        }
        let members = self.parse_members();
        Some(GlobalDecl {
            exported,
            name,
            members,
            span: self.span_from(start),
        })
    }

    /// `component Name [inherits Base] { members }`
    fn parse_component(&mut self, exported: bool) -> Option<ComponentDecl> {
        let start = self.current_token.position;
        let name = self.expect_peek_name()?;
        let base = if self.is_peek_token(TokenType::Inherits) {
            self.next_token();
            Some(self.expect_peek_name()?)
        } else {
            None
        };
        if !self.expect_peek(TokenType::LBrace) {
            return None;
        }
        let members = self.parse_members();
        Some(ComponentDecl {
            exported,
            name,
            base,
            members,
            span: self.span_from(start),
        })
    }

    /// Entered on `{`, returns on the matching `}` (or EOF).
    pub(super) fn parse_members(&mut self) -> Vec<Member> {
        let mut members = Vec::new();
        self.next_token();

        while !self.is_current_token(TokenType::RBrace) && !self.is_current_token(TokenType::Eof)
        {
            match self.parse_member() {
                Some(member) => members.push(member),
                None => {
                    if self.synchronize() {
                        break;
                    }
                }
            }
            self.next_token();
        }

        if self.is_current_token(TokenType::Eof) {
            self.current_error("`}`");
        }
        members
    }

    fn parse_member(&mut self) -> Option<Member> {
        match self.current_token.token_type {
            TokenType::In | TokenType::Out | TokenType::InOut | TokenType::Private => {
                let visibility = match self.current_token.token_type {
                    TokenType::In => Visibility::In,
                    TokenType::Out => Visibility::Out,
                    TokenType::Private => Visibility::Private,
                    _ => Visibility::InOut,
                };
                let start = self.current_token.position;
                if !self.expect_peek(TokenType::Property) {
                    return None;
                }
                self.parse_property(visibility, start).map(Member::Property)
            }
            TokenType::Property => {
                let start = self.current_token.position;
                self.parse_property(Visibility::InOut, start)
                    .map(Member::Property)
            }
            TokenType::Callback => self.parse_callback().map(Member::Callback),
            TokenType::For => self.parse_repeater().map(Member::Repeater),
            TokenType::Semicolon => None,
            _ if Self::is_name_token(&self.current_token) => self.parse_named_member(),
            _ => {
                self.current_error("a property, callback, binding or element");
                None
            }
        }
    }

    /// `property <type> name [: expr];`, entered on `property`.
    fn parse_property(
        &mut self,
        visibility: Visibility,
        start: crate::diagnostics::Position,
    ) -> Option<PropertyDecl> {
        if !self.expect_peek(TokenType::Lt) {
            return None;
        }
        self.next_token();
        let ty = self.parse_type()?;
        if !self.expect_peek(TokenType::Gt) {
            return None;
        }
        let name = self.expect_peek_name()?;

        let binding = match self.peek_token.token_type {
            TokenType::Colon => {
                self.next_token();
                self.next_token();
                Some(self.parse_expression(Precedence::Lowest)?)
            }
            TokenType::TwoWay => {
                self.next_token();
                let span = self.current_token.span();
                self.error(&UNSUPPORTED_SYNTAX, &["Two-way binding `<=>`"], span);
                return None;
            }
            _ => None,
        };
        if !self.expect_peek(TokenType::Semicolon) {
            return None;
        }

        Some(PropertyDecl {
            visibility,
            ty,
            name,
            binding,
            span: self.span_from(start),
        })
    }

    /// `callback name[(type, name: type, ...)] [-> type];`
    fn parse_callback(&mut self) -> Option<CallbackDecl> {
        let start = self.current_token.position;
        let name = self.expect_peek_name()?;
        let mut parameters = Vec::new();

        if self.is_peek_token(TokenType::LParen) {
            self.next_token();
            while !self.is_peek_token(TokenType::RParen) {
                self.next_token();
                // Parameter names are documentation only: `callback f(count: int)`.
                if Self::is_name_token(&self.current_token) && self.is_peek_token(TokenType::Colon)
                {
                    self.next_token();
                    self.next_token();
                }
                parameters.push(self.parse_type()?);
                if !self.is_peek_token(TokenType::Comma) {
                    break;
                }
                self.next_token();
            }
            if !self.expect_peek(TokenType::RParen) {
                return None;
            }
        }

        let return_type = if self.is_peek_token(TokenType::Arrow) {
            self.next_token();
            self.next_token();
            Some(self.parse_type()?)
        } else {
            None
        };

        if !self.expect_peek(TokenType::Semicolon) {
            return None;
        }
        Some(CallbackDecl {
            name,
            parameters,
            return_type,
            span: self.span_from(start),
        })
    }

    /// Members that start with a name: bindings, handlers and child elements.
    fn parse_named_member(&mut self) -> Option<Member> {
        match self.peek_token.token_type {
            TokenType::Colon => self.parse_binding().map(Member::Binding),
            TokenType::ColonAssign | TokenType::LBrace => self.parse_element().map(Member::Element),
            TokenType::FatArrow | TokenType::LParen => self.parse_handler().map(Member::Handler),
            _ => {
                self.peek_error("`:`, `:=`, `{`, `(` or `=>`");
                None
            }
        }
    }

    /// `name: expr;`
    fn parse_binding(&mut self) -> Option<BindingDecl> {
        let start = self.current_token.position;
        let name = self.current_identifier();
        self.next_token(); // ':'
        self.next_token();
        let expression = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenType::Semicolon) {
            return None;
        }
        Some(BindingDecl {
            name,
            expression,
            span: self.span_from(start),
        })
    }

    /// `name(a, b) => { ... }` or `name => { ... }`
    fn parse_handler(&mut self) -> Option<HandlerDecl> {
        let start = self.current_token.position;
        let name = self.current_identifier();
        let mut parameters = Vec::new();

        if self.is_peek_token(TokenType::LParen) {
            self.next_token();
            while !self.is_peek_token(TokenType::RParen) {
                parameters.push(self.expect_peek_name()?);
                if !self.is_peek_token(TokenType::Comma) {
                    break;
                }
                self.next_token();
            }
            if !self.expect_peek(TokenType::RParen) {
                return None;
            }
        }

        if !self.expect_peek(TokenType::FatArrow) || !self.expect_peek(TokenType::LBrace) {
            return None;
        }
        let body = self.parse_block();
        Some(HandlerDecl {
            name,
            parameters,
            body,
            span: self.span_from(start),
        })
    }

    /// `[id :=] Type { members }`
    fn parse_element(&mut self) -> Option<ElementDecl> {
        let start = self.current_token.position;
        let id = if self.is_peek_token(TokenType::ColonAssign) {
            let id = self.current_identifier();
            self.next_token();
            self.expect_peek_name()?;
            Some(id)
        } else {
            None
        };
        let type_name = self.current_identifier();
        if !self.expect_peek(TokenType::LBrace) {
            return None;
        }
        let members = self.parse_members();
        Some(ElementDecl {
            id,
            type_name,
            members,
            span: self.span_from(start),
        })
    }

    /// `for item[index] in model : [id :=] Type { members }`
    fn parse_repeater(&mut self) -> Option<RepeaterDecl> {
        let start = self.current_token.position;
        let item = self.expect_peek_name()?;
        let index = if self.is_peek_token(TokenType::LBracket) {
            self.next_token();
            let index = self.expect_peek_name()?;
            if !self.expect_peek(TokenType::RBracket) {
                return None;
            }
            Some(index)
        } else {
            None
        };
        if !self.expect_peek(TokenType::In) {
            return None;
        }
        self.next_token();
        let model = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenType::Colon) {
            return None;
        }
        self.expect_peek_name()?;
        let element = self.parse_element()?;
        Some(RepeaterDecl {
            item,
            index,
            model,
            element,
            span: self.span_from(start),
        })
    }

    /// `int`, `[T]`, `{ field: T }` or a struct name.
    pub(super) fn parse_type(&mut self) -> Option<TypeExpr> {
        let start = self.current_token.position;
        match self.current_token.token_type {
            TokenType::LBracket => {
                self.next_token();
                let element = self.parse_type()?;
                if !self.expect_peek(TokenType::RBracket) {
                    return None;
                }
                Some(TypeExpr::Array {
                    element: Box::new(element),
                    span: self.span_from(start),
                })
            }
            TokenType::LBrace => {
                let fields = self.parse_field_types()?;
                Some(TypeExpr::Struct {
                    fields,
                    span: self.span_from(start),
                })
            }
            _ if Self::is_name_token(&self.current_token) => Some(TypeExpr::Named {
                name: self.current_identifier(),
                span: self.current_token.span(),
            }),
            _ => {
                self.current_error("a type");
                None
            }
        }
    }
}

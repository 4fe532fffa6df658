//! Shared documentation samples for scoring tests.

/// Well-formed README for `function add(a,b){return a+b}`: one example,
/// every other criterion complete.
pub(crate) const ADD_README: &str = r#"# calc

A tiny arithmetic helper library for JavaScript projects. It exposes a single pure function that
adds two numbers together, making it easy to drop into build scripts, tests, or any small utility
module that needs predictable math.

## Overview

The module has no dependencies and works in Node.js and the browser alike without any setup.

## Installation

Install the package with npm and import it where needed.

## Usage

```js
const { add } = require('calc');
console.log(add(2, 3)); // 5
```

## API Reference

### add(a, b)

Adds two numbers and returns their sum as a number.

## License

MIT
"#;

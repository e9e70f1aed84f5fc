use std::{
    io,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    task::{Context, Poll},
};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::sync::WaitGroup;

use super::Conn;

/// 由 ConnGroup 建立的连接
/// 读写原样转发给底层连接；第一次关闭（或被丢弃）时，给所属 group 的计数减一
pub struct GroupConn<C> {
    inner: C,
    group: Arc<WaitGroup>,
    released: AtomicBool,
}

impl<C: Conn> GroupConn<C> {
    pub(super) fn new(inner: C, group: Arc<WaitGroup>) -> Self {
        Self {
            inner,
            group,
            released: AtomicBool::new(false),
        }
    }

    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.group.done();
        }
    }
}

impl<C: Conn> Conn for GroupConn<C> {
    /// 无论底层关闭成功与否、调用多少次，group 计数只减一次
    fn close(&self) -> io::Result<()> {
        let res = self.inner.close();
        self.release();
        res
    }
}

impl<C> Drop for GroupConn<C> {
    fn drop(&mut self) {
        if !*self.released.get_mut() {
            self.group.done();
        }
    }
}

impl<C: Conn> AsyncRead for GroupConn<C> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl<C: Conn> AsyncWrite for GroupConn<C> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }
}
